//! Encoder trait: the abstraction over embedding models.
//!
//! An encoder turns text into fixed-dimension vectors. It is used once at
//! startup to probe the dimensionality, and then once per incoming query.

use async_trait::async_trait;

use crate::error::EncoderError;

/// The core Encoder trait.
///
/// Implementations must return exactly one vector per input text. They are
/// shared across concurrent calls, hence `Send + Sync`.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// A human-readable name for this encoder (e.g., "tei", "openai").
    fn name(&self) -> &str;

    /// Encode a batch of texts.
    async fn encode(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, EncoderError>;

    /// Encode a single text.
    ///
    /// Default implementation calls `encode()` with a one-element batch.
    async fn encode_one(&self, text: &str) -> std::result::Result<Vec<f32>, EncoderError> {
        self.encode(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EncoderError::MalformedResponse("no vector returned".into()))
    }
}
