//! Selector error types.

use thiserror::Error;

use crate::matcher::MatcherError;

/// Errors raised while compiling selectors.
///
/// All of them are detected before any message is examined.
#[derive(Debug, Error)]
pub enum SelectorError {
    /// No selector is registered under this name.
    #[error("unknown selector '{0}'")]
    UnknownSelector(String),

    /// An argument was missing or malformed.
    #[error("selector '{selector}': {reason}")]
    BadArgument {
        /// Selector name.
        selector: String,
        /// What was wrong.
        reason: String,
    },

    /// A plain selector was used where a history selector is required.
    #[error("selector '{0}' cannot be used as history selector")]
    NotHistorySelector(String),

    /// Negation was requested for a history selector.
    #[error("negated selectors (here '{0}') cannot be used as history selectors")]
    NegatedHistory(String),

    /// A user in a user list is not configured.
    #[error("selector '{selector}': user '{user}' not defined")]
    UnknownUser {
        /// Selector name.
        selector: String,
        /// Offending user.
        user: String,
    },

    /// A tag in a tag list is not configured.
    #[error("selector '{selector}': review tag '{tag}' not defined")]
    UnknownTag {
        /// Selector name.
        selector: String,
        /// Offending tag.
        tag: String,
    },

    /// A matching expression did not compile.
    #[error("selector '{selector}': {source}")]
    BadExpression {
        /// Selector name.
        selector: String,
        /// Parser diagnostic.
        #[source]
        source: MatcherError,
    },
}

impl SelectorError {
    /// Shorthand for [`SelectorError::BadArgument`].
    pub fn bad_argument(selector: &str, reason: impl Into<String>) -> Self {
        Self::BadArgument {
            selector: selector.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Result type for selector compilation.
pub type Result<T> = std::result::Result<T, SelectorError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
