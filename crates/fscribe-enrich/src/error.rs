//! Enrichment error types.

use thiserror::Error;

/// Result type for enrichment operations.
pub type EnrichResult<T> = Result<T, EnrichError>;

/// Errors that can occur during enrichment.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("GEMINI_API_KEY not set")]
    MissingApiKey,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backend request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Backend returned no content")]
    EmptyResponse,

    #[error("Malformed insight payload: {0}")]
    MalformedInsight(String),
}

impl EnrichError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Self::Backend {
            status,
            message: message.into(),
        }
    }

    /// Check if a fresh attempt could succeed.
    ///
    /// Network errors, backend failures, and unparseable responses are all
    /// worth retrying; missing credentials and bad configuration are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EnrichError::Request(_)
                | EnrichError::Backend { .. }
                | EnrichError::EmptyResponse
                | EnrichError::MalformedInsight(_)
        )
    }
}
