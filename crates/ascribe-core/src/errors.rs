//! Core error types.

use thiserror::Error;

/// Errors raised by the foundation types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A timestamp string matched none of the accepted layouts.
    #[error("cannot parse date string '{0}'")]
    Timestamp(String),

    /// A timestamp had valid layout but described no real instant.
    #[error("date out of range: '{0}'")]
    TimestampRange(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_error_display() {
        let err = CoreError::Timestamp("yesterday".into());
        assert_eq!(err.to_string(), "cannot parse date string 'yesterday'");
    }

    #[test]
    fn range_error_display() {
        let err = CoreError::TimestampRange("2024-13-40".into());
        assert!(err.to_string().contains("2024-13-40"));
    }
}
