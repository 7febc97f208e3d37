//! History error types.

use thiserror::Error;

/// Errors raised while encoding, decoding, or writing ascriptions.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Every marker up to the configured cap occurs in the values.
    #[error("no field separator up to length {cap} is free in the message values")]
    SeparatorCap {
        /// Longest marker length tried.
        cap: usize,
    },

    /// A blob did not contain the marker expected at the cursor.
    #[error("field separator of length {len} not found at offset {offset}")]
    MissingMarker {
        /// Marker length looked for.
        len: usize,
        /// Cursor offset where the search began.
        offset: usize,
    },

    /// A back-reference pointed outside the decoded values.
    #[error("back-reference e{index} points past {available} decoded values")]
    BackReference {
        /// Referenced write index.
        index: usize,
        /// Number of values decoded so far.
        available: usize,
    },

    /// A back-reference token had no digits.
    #[error("malformed back-reference token '{0}'")]
    MalformedToken(String),

    /// The writing user is not configured.
    #[error("user '{0}' is not defined")]
    UnknownUser(String),

    /// The review tag is not configured.
    #[error("review tag '{0}' is not defined")]
    UnknownTag(String),

    /// The operation may not be performed by this user.
    #[error("user '{user}' not allowed in {operation}")]
    UserNotAllowed {
        /// Offending user.
        user: String,
        /// Operation name.
        operation: &'static str,
    },
}

/// Result type for history operations.
pub type Result<T> = std::result::Result<T, HistoryError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_cap_display() {
        let err = HistoryError::SeparatorCap { cap: 64 };
        assert!(err.to_string().contains("64"));
    }

    #[test]
    fn back_reference_display() {
        let err = HistoryError::BackReference {
            index: 3,
            available: 1,
        };
        assert_eq!(err.to_string(), "back-reference e3 points past 1 decoded values");
    }

    #[test]
    fn not_allowed_display() {
        let err = HistoryError::UserNotAllowed {
            user: "fuzzy".into(),
            operation: "review",
        };
        assert_eq!(err.to_string(), "user 'fuzzy' not allowed in review");
    }
}
