//! Business rejections.
//!
//! A rejection is a decision, not a failure: the request was well-formed and
//! the stores answered, but the purchase is not allowed. Each carries a stable
//! machine code and a human message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    NotFound,
    Unavailable,
    OutOfWindow,
    CapacityExceeded,
    StockInsufficient,
    ConflictingPromotions,
    InsufficientPoints,
    InvalidRequest,
}

impl RejectionKind {
    /// Stable wire code.
    pub fn code(self) -> &'static str {
        match self {
            RejectionKind::NotFound => "not_found",
            RejectionKind::Unavailable => "unavailable",
            RejectionKind::OutOfWindow => "out_of_window",
            RejectionKind::CapacityExceeded => "capacity_exceeded",
            RejectionKind::StockInsufficient => "stock_insufficient",
            RejectionKind::ConflictingPromotions => "conflicting_promotions",
            RejectionKind::InsufficientPoints => "insufficient_points",
            RejectionKind::InvalidRequest => "invalid_request",
        }
    }
}

impl core::fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct Rejection {
    pub kind: RejectionKind,
    pub message: String,
}

impl Rejection {
    pub fn new(kind: RejectionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RejectionKind::NotFound, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(RejectionKind::Unavailable, message)
    }

    pub fn out_of_window(message: impl Into<String>) -> Self {
        Self::new(RejectionKind::OutOfWindow, message)
    }

    pub fn capacity(message: impl Into<String>) -> Self {
        Self::new(RejectionKind::CapacityExceeded, message)
    }

    pub fn stock(message: impl Into<String>) -> Self {
        Self::new(RejectionKind::StockInsufficient, message)
    }

    pub fn conflicting_promotions() -> Self {
        Self::new(RejectionKind::ConflictingPromotions, "cannot combine promotions")
    }

    pub fn insufficient_points(message: impl Into<String>) -> Self {
        Self::new(RejectionKind::InsufficientPoints, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(RejectionKind::InvalidRequest, message)
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}
