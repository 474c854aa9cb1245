//! Provider router: selects the generation provider and encoder from config.

use std::sync::Arc;
use std::time::Duration;

use groundwire_config::{EncoderConfig, GenerationConfig};
use groundwire_core::error::{EncoderError, ProviderError};
use groundwire_core::{Encoder, Provider};

use crate::embedding::{EncoderBackend, HttpEncoder};
use crate::openai_compat::OpenAiCompatProvider;

/// Build the chat-completion provider described by `[generation]`.
///
/// A missing key is not rejected here; the provider reports it as
/// `NotConfigured` before its first request.
pub fn build_provider(config: &GenerationConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let base_url = config
        .api_url
        .clone()
        .unwrap_or_else(|| default_base_url(&config.provider));

    let api_key = match config.provider.as_str() {
        // Ollama doesn't need a real key
        "ollama" => config.api_key.clone().unwrap_or_else(|| "ollama".into()),
        _ => config.api_key.clone().unwrap_or_default(),
    };

    let provider = OpenAiCompatProvider::new(
        &config.provider,
        base_url,
        api_key,
        Duration::from_secs(config.timeout_secs),
    )?;
    Ok(Arc::new(provider))
}

/// Build the embedding encoder described by `[encoder]`.
///
/// The result is not yet probed; wrap it in
/// [`ProbedEncoder`](crate::embedding::ProbedEncoder) at startup.
pub fn build_encoder(config: &EncoderConfig) -> Result<Arc<dyn Encoder>, EncoderError> {
    let backend = EncoderBackend::parse(&config.backend).ok_or_else(|| {
        EncoderError::MalformedResponse(format!("unknown encoder backend '{}'", config.backend))
    })?;

    let encoder = HttpEncoder::new(
        backend,
        &config.url,
        &config.model,
        config.api_key.clone(),
        Duration::from_secs(config.timeout_secs),
    )?;
    Ok(Arc::new(encoder))
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "groq" => "https://api.groq.com/openai/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
