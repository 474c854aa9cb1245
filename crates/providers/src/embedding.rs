//! Embedding model adapters.
//!
//! - [`HttpEncoder`] calls a hosted embedding service, either a
//!   text-embeddings-inference server (`POST /embed`) or an
//!   OpenAI-compatible endpoint (`POST /embeddings`).
//! - [`ProbedEncoder`] wraps any encoder, learns the output dimension from a
//!   placeholder text at startup, and rejects vectors of any other length.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use groundwire_core::Encoder;
use groundwire_core::error::EncoderError;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Wire format spoken by the embedding service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderBackend {
    /// text-embeddings-inference: `{"inputs": [...]}` in, `[[f32]]` out
    Tei,
    /// OpenAI embeddings API: `{"model", "input"}` in, `{"data": [{"embedding"}]}` out
    OpenAi,
}

impl EncoderBackend {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "tei" => Some(Self::Tei),
            "openai" => Some(Self::OpenAi),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Tei => "tei",
            Self::OpenAi => "openai",
        }
    }
}

/// Encoder backed by an HTTP embedding service.
pub struct HttpEncoder {
    backend: EncoderBackend,
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpEncoder {
    pub fn new(
        backend: EncoderBackend,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, EncoderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EncoderError::Network(format!("HTTP client: {e}")))?;

        Ok(Self {
            backend,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
            client,
        })
    }

    fn request(&self, texts: &[String]) -> reqwest::RequestBuilder {
        let builder = match self.backend {
            EncoderBackend::Tei => self
                .client
                .post(format!("{}/embed", self.base_url))
                .json(&serde_json::json!({ "inputs": texts })),
            EncoderBackend::OpenAi => self
                .client
                .post(format!("{}/embeddings", self.base_url))
                .json(&serde_json::json!({
                    "model": self.model,
                    "input": texts,
                    "encoding_format": "float",
                })),
        };

        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn parse_body(&self, body: &str) -> Result<Vec<Vec<f32>>, EncoderError> {
        match self.backend {
            EncoderBackend::Tei => serde_json::from_str::<Vec<Vec<f32>>>(body)
                .map_err(|e| EncoderError::MalformedResponse(e.to_string())),
            EncoderBackend::OpenAi => {
                let resp: EmbeddingApiResponse = serde_json::from_str(body)
                    .map_err(|e| EncoderError::MalformedResponse(e.to_string()))?;
                Ok(resp.data.into_iter().map(|d| d.embedding).collect())
            }
        }
    }
}

#[async_trait]
impl Encoder for HttpEncoder {
    fn name(&self) -> &str {
        self.backend.as_str()
    }

    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError> {
        debug!(
            backend = self.backend.as_str(),
            model = %self.model,
            count = texts.len(),
            "Sending embedding request"
        );

        let response = self
            .request(texts)
            .send()
            .await
            .map_err(|e| EncoderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| EncoderError::Network(e.to_string()))?;

        if !(200..300).contains(&status) {
            warn!(status, body = %body, "Embedding service returned error");
            return Err(EncoderError::ApiError {
                status_code: status,
                message: body,
            });
        }

        let vectors = self.parse_body(&body)?;
        if vectors.len() != texts.len() {
            return Err(EncoderError::MalformedResponse(format!(
                "expected {} vectors, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingApiResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// An encoder whose output dimension was established by a startup probe.
///
/// Every vector returned afterwards is checked against that dimension.
pub struct ProbedEncoder {
    inner: Arc<dyn Encoder>,
    dims: usize,
}

impl std::fmt::Debug for ProbedEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbedEncoder")
            .field("inner", &self.inner.name())
            .field("dims", &self.dims)
            .finish()
    }
}

impl ProbedEncoder {
    /// Encode `probe_text` once and remember the vector length.
    pub async fn probe(inner: Arc<dyn Encoder>, probe_text: &str) -> Result<Self, EncoderError> {
        let vector = inner.encode_one(probe_text).await?;
        if vector.is_empty() {
            return Err(EncoderError::MalformedResponse(
                "probe returned an empty vector".into(),
            ));
        }
        info!(encoder = inner.name(), dims = vector.len(), "Probed embedding dimension");
        Ok(Self {
            inner,
            dims: vector.len(),
        })
    }

    /// Output dimension of the wrapped encoder.
    pub fn dims(&self) -> usize {
        self.dims
    }
}

#[async_trait]
impl Encoder for ProbedEncoder {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError> {
        let vectors = self.inner.encode(texts).await?;
        if vectors.iter().any(|v| v.is_empty()) {
            return Err(EncoderError::MalformedResponse(
                "encoder returned an empty vector".into(),
            ));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dims) {
            return Err(EncoderError::DimensionMismatch {
                expected: self.dims,
                actual: bad.len(),
            });
        }
        Ok(vectors)
    }
}
