//! Error taxonomy shared by the retrieval and answering pipeline.
//!
//! Two failure classes never show up here: a missing document root turns
//! into a [`ReindexStatus::Skipped`](crate::models::ReindexStatus::Skipped)
//! outcome, and unreadable files are logged and left out of the index.
//! Everything else that can end a request is a [`RagError`].

use std::time::Duration;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Debug, Error)]
pub enum RagError {
    /// The full-text engine rejected the search expression.
    #[error("invalid search query: {0}")]
    QuerySyntax(String),

    /// The model backend failed or returned something unusable.
    #[error("model inference failed: {0}")]
    ModelInference(String),

    /// A pipeline step exceeded its configured time bound.
    #[error("{operation} timed out after {limit:?}")]
    Timeout {
        operation: &'static str,
        limit: Duration,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RagError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        RagError::Internal(err.to_string())
    }

    /// Stable machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            RagError::QuerySyntax(_) => "query_syntax",
            RagError::ModelInference(_) => "model_error",
            RagError::Timeout { .. } => "timeout",
            RagError::Database(_) | RagError::Io(_) | RagError::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(RagError::QuerySyntax("x".into()).code(), "query_syntax");
        assert_eq!(RagError::ModelInference("x".into()).code(), "model_error");
        assert_eq!(
            RagError::Timeout {
                operation: "search",
                limit: Duration::from_secs(3)
            }
            .code(),
            "timeout"
        );
        assert_eq!(RagError::internal("boom").code(), "internal");
    }

    #[test]
    fn test_timeout_message() {
        let err = RagError::Timeout {
            operation: "translation",
            limit: Duration::from_secs(12),
        };
        assert_eq!(err.to_string(), "translation timed out after 12s");

        let err = RagError::Timeout {
            operation: "search",
            limit: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "search timed out after 250ms");
    }
}
