//! Response generation: one chat-completion request per call.

use std::sync::Arc;

use groundwire_config::GenerationConfig;
use groundwire_core::error::ProviderError;
use groundwire_core::message::MessageSequence;
use groundwire_core::provider::{Provider, ProviderRequest};
use tracing::debug;

/// Sends an assembled sequence to the configured model.
///
/// No retries: the first failure is returned to the caller.
pub struct ResponseGenerator {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl ResponseGenerator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn from_config(provider: Arc<dyn Provider>, config: &GenerationConfig) -> Self {
        Self {
            provider,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Return the generated text for `sequence`.
    pub async fn generate(&self, sequence: MessageSequence) -> groundwire_core::Result<String> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: sequence.into_messages(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self.provider.complete(request).await?;

        if let Some(usage) = &response.usage {
            debug!(
                model = %response.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Generation usage"
            );
        }

        if response.message.content.trim().is_empty() {
            return Err(ProviderError::MalformedResponse("empty completion".into()).into());
        }

        Ok(response.message.content)
    }
}
