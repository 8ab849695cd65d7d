//! Crate-wide error taxonomy.
//!
//! Every fallible operation in the pipeline returns [`QaError`]. The variants
//! map one-to-one onto the failure classes callers must distinguish:
//!
//! - [`QaError::InvalidInput`] — bad caller input (empty question, bad chunk
//!   window parameters). Not retryable; fix the call.
//! - [`QaError::EmptyIndex`] / [`QaError::IndexNotFound`] — no corpus has
//!   been ingested yet. User-actionable ("run ingestion first").
//! - [`QaError::DimensionMismatch`] — the embedder and the index disagree on
//!   vector dimensionality. A build-time misconfiguration; never recovered.
//! - [`QaError::Generation`] — the completion service failed, with a
//!   [`GenerationFailure`] cause so the pipeline can pick a fallback answer
//!   instead of propagating a raw failure to the end user.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Cause of a completion-service failure.
///
/// Timeout and transport failures are retryable by the caller; an empty
/// response means the service answered but produced nothing usable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationFailure {
    /// The completion request exceeded its deadline.
    Timeout,
    /// The completion request failed at the transport level.
    Transport,
    /// The completion service returned an empty or malformed response.
    EmptyResponse,
}

impl std::fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationFailure::Timeout => write!(f, "timeout"),
            GenerationFailure::Transport => write!(f, "transport"),
            GenerationFailure::EmptyResponse => write!(f, "empty response"),
        }
    }
}

/// Errors surfaced by the question-answering pipeline and its components.
#[derive(Debug, thiserror::Error)]
pub enum QaError {
    /// The caller supplied input the pipeline cannot work with.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The runtime configuration is unusable (bad override value, HTTP
    /// client construction failure).
    #[error("configuration error: {0}")]
    Config(String),

    /// A search was attempted against an index with no stored vectors.
    #[error("vector index is empty; run ingestion before serving queries")]
    EmptyIndex,

    /// No persisted index exists at the given path.
    #[error("no persisted index found at {path}; run ingestion first")]
    IndexNotFound { path: PathBuf },

    /// Embedder and index disagree on vector dimensionality.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The embedding service failed.
    #[error("embedding service failure: {0}")]
    Embedding(String),

    /// The completion service failed.
    #[error("completion service failure ({cause}): {message}")]
    Generation {
        cause: GenerationFailure,
        message: String,
    },

    /// Persisting or loading the index failed.
    #[error("index storage failure: {0}")]
    Storage(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl QaError {
    /// Shorthand for a [`QaError::Generation`] with the given cause.
    pub fn generation(cause: GenerationFailure, message: impl Into<String>) -> Self {
        QaError::Generation {
            cause,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_error_reports_cause() {
        let err = QaError::generation(GenerationFailure::Timeout, "deadline exceeded");
        assert!(err.to_string().contains("timeout"));

        let err = QaError::generation(GenerationFailure::EmptyResponse, "no choices");
        assert!(err.to_string().contains("empty response"));
    }

    #[test]
    fn index_not_found_names_path() {
        let err = QaError::IndexNotFound {
            path: PathBuf::from("/tmp/index.json"),
        };
        assert!(err.to_string().contains("/tmp/index.json"));
    }
}
