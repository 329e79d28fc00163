//! Common error types for the gallery

use thiserror::Error;

/// Common result type for gallery operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the catalog, the adapters and the HTTP layer
#[derive(Error, Debug)]
pub enum Error {
    /// Unknown painting id or category
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or malformed required field
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Stored value differs from the one supplied for verification
    #[error("Mismatch: {0}")]
    Mismatch(String),

    /// Backing store or network failure outside the database
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for failures of the backing store itself (database, network, disk).
    ///
    /// Reads swallow these; writes propagate them.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Error::Upstream(_) | Error::Database(_) | Error::Io(_))
    }

    /// Short machine-readable name used in logs and diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "NotFoundError",
            Error::Validation(_) => "ValidationError",
            Error::Mismatch(_) => "MismatchError",
            Error::Upstream(_) | Error::Database(_) | Error::Io(_) => "UpstreamError",
            Error::Config(_) => "ConfigError",
            Error::Internal(_) => "InternalError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_class_covers_store_failures() {
        assert!(Error::Upstream("timeout".into()).is_upstream());
        assert!(Error::Io(std::io::Error::other("disk")).is_upstream());
        assert!(Error::Database(sqlx::Error::PoolTimedOut).is_upstream());

        assert!(!Error::NotFound("p1".into()).is_upstream());
        assert!(!Error::Validation("empty".into()).is_upstream());
        assert!(!Error::Mismatch("42 != 99".into()).is_upstream());
        assert!(!Error::Config("password".into()).is_upstream());
    }

    #[test]
    fn kind_names_match_taxonomy() {
        assert_eq!(Error::NotFound("x".into()).kind(), "NotFoundError");
        assert_eq!(Error::Mismatch("x".into()).kind(), "MismatchError");
        assert_eq!(Error::Database(sqlx::Error::PoolClosed).kind(), "UpstreamError");
    }
}
