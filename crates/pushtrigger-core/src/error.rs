//! Error taxonomy for run predicate evaluation.

/// Errors produced while deciding whether a job should run for a push.
#[derive(Debug, thiserror::Error)]
pub enum PredicateError {
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("could not list changed files: {0}")]
    ChangedFiles(String),
}

impl PredicateError {
    pub(crate) fn invalid_pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        PredicateError::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }
}

/// Result type for predicate evaluation.
pub type Result<T> = std::result::Result<T, PredicateError>;
