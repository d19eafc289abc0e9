//! Optimistic concurrency for versioned campaign rows.

use crate::error::{DomainError, DomainResult};

/// The campaign version a capacity decision was made against.
///
/// Every seat hold moves a group-buy campaign to its next version, so a hold
/// written against a stale version means someone else took a seat after the
/// decision was made.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExpectedVersion(u64);

impl ExpectedVersion {
    pub fn new(version: u64) -> Self {
        Self(version)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Compare against the row's current version and return the version the
    /// row moves to when the write goes ahead.
    pub fn advance(self, actual: u64) -> DomainResult<u64> {
        if self.0 != actual {
            return Err(DomainError::conflict(format!(
                "campaign moved from version {} to {actual}",
                self.0
            )));
        }
        actual
            .checked_add(1)
            .ok_or_else(|| DomainError::invariant("campaign version overflow"))
    }
}
