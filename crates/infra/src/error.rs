//! Infrastructure errors and the resolver's combined error type.

use thiserror::Error;

use cartline_core::DomainError;
use cartline_pricing::Rejection;

/// Store operation error.
///
/// Kept apart from [`Rejection`]: a store error says nothing about whether
/// the purchase is allowed, only that the answer could not be obtained.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend unreachable (pool closed, connection refused, timeout).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Backend answered with an error.
    #[error("store backend error: {0}")]
    Backend(String),

    /// A row or payload could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Write-once record already exists, or a versioned write lost a race.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl StoreError {
    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<DomainError> for StoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Conflict(msg) => StoreError::Conflict(msg),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Outcome of a failed resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ResolveError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ResolveError::Rejected(_) => false,
            ResolveError::Store(e) => e.is_retryable(),
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            ResolveError::Rejected(r) => Some(r),
            ResolveError::Store(_) => None,
        }
    }
}

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // unique violation
                Some("23505") => StoreError::Conflict(msg),
                // serialization failure under REPEATABLE READ
                Some("40001") => StoreError::Unavailable(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool unavailable in {}", operation))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {}: {}", operation, e)),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Serialization(format!("row decode failed in {}: {}", operation, err))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_failures_are_retryable() {
        assert!(StoreError::Unavailable("down".into()).is_retryable());
        assert!(!StoreError::Conflict("dup".into()).is_retryable());
        assert!(!StoreError::Backend("syntax".into()).is_retryable());
        assert!(!ResolveError::from(Rejection::capacity("campaign full")).is_retryable());
    }

    #[test]
    fn stale_version_becomes_a_store_conflict() {
        let err = StoreError::from(DomainError::conflict("campaign moved"));
        assert!(matches!(err, StoreError::Conflict(ref m) if m == "campaign moved"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn pool_closed_maps_to_unavailable() {
        let e = map_sqlx_error("get_product", sqlx::Error::PoolClosed);
        assert!(matches!(e, StoreError::Unavailable(_)));
    }
}
