//! Error types for the Groundwire domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external collaborator has its own bounded-context error; all of them
//! fold into the five-way top-level [`Error`] taxonomy the pipeline exposes.

use thiserror::Error;

/// The top-level error type for all Groundwire operations.
///
/// None of these are recovered internally. Retrieving zero documents is not
/// an error and never produces one of these.
#[derive(Debug, Error)]
pub enum Error {
    // --- Configuration errors (fatal, never retried) ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Encoder errors ---
    #[error("Encoding error: {0}")]
    Encoding(EncoderError),

    // --- Vector store errors ---
    #[error("Index '{name}' did not become ready after {attempts} readiness checks")]
    IndexUnavailable { name: String, attempts: u32 },

    #[error("Retrieval error: {0}")]
    Retrieval(VectorStoreError),

    // --- Generation errors ---
    #[error("Generation error: {0}")]
    Generation(ProviderError),
}

impl Error {
    /// Build a configuration error from any message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Short machine-readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Encoding(_) => "encoding",
            Self::IndexUnavailable { .. } => "index_unavailable",
            Self::Retrieval(_) => "retrieval",
            Self::Generation(_) => "generation",
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum EncoderError {
    #[error("Encoder unreachable: {0}")]
    Network(String),

    #[error("Encoder request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Malformed encoder response: {0}")]
    MalformedResponse(String),

    #[error("Embedding dimension changed: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Error)]
pub enum VectorStoreError {
    #[error("Vector store unreachable: {0}")]
    Network(String),

    #[error("Vector store request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Vector store authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Index '{name}' not ready after {attempts} checks")]
    IndexUnavailable { name: String, attempts: u32 },

    #[error("Index '{name}' has dimension {actual}, encoder produces {expected}")]
    DimensionMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Malformed vector store response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl From<EncoderError> for Error {
    fn from(err: EncoderError) -> Self {
        match err {
            EncoderError::DimensionMismatch { .. } => Self::config(err.to_string()),
            other => Self::Encoding(other),
        }
    }
}

impl From<VectorStoreError> for Error {
    fn from(err: VectorStoreError) -> Self {
        match err {
            VectorStoreError::IndexUnavailable { name, attempts } => {
                Self::IndexUnavailable { name, attempts }
            }
            VectorStoreError::DimensionMismatch { .. } => Self::config(err.to_string()),
            other => Self::Retrieval(other),
        }
    }
}

impl From<ProviderError> for Error {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConfigured(message) => Self::Config { message },
            other => Self::Generation(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::from(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
        assert_eq!(err.kind(), "generation");
    }

    #[test]
    fn missing_provider_credential_is_config_error() {
        let err = Error::from(ProviderError::NotConfigured("GROQ_API_KEY is not set".into()));
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[test]
    fn encoder_dimension_drift_is_config_error() {
        let err = Error::from(EncoderError::DimensionMismatch {
            expected: 768,
            actual: 384,
        });
        assert_eq!(err.kind(), "config");
        assert!(err.to_string().contains("768"));
    }

    #[test]
    fn encoder_failures_stay_encoding_errors() {
        let err = Error::from(EncoderError::Network("connection refused".into()));
        assert_eq!(err.kind(), "encoding");
    }

    #[test]
    fn readiness_timeout_maps_to_index_unavailable() {
        let err = Error::from(VectorStoreError::IndexUnavailable {
            name: "nyc-guide".into(),
            attempts: 8,
        });
        match err {
            Error::IndexUnavailable { name, attempts } => {
                assert_eq!(name, "nyc-guide");
                assert_eq!(attempts, 8);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn query_failure_maps_to_retrieval() {
        let err = Error::from(VectorStoreError::ApiError {
            status_code: 503,
            message: "unavailable".into(),
        });
        assert_eq!(err.kind(), "retrieval");
    }
}
