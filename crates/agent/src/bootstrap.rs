//! Startup wiring: config → probed encoder → ready index → pipeline.

use std::sync::Arc;

use groundwire_config::{AppConfig, ConfigError, VECTOR_STORE_KEY_ENV};
use groundwire_core::vector::{IndexSpec, VectorStore};
use groundwire_core::Result;
use groundwire_providers::{ProbedEncoder, build_encoder, build_provider};
use groundwire_vector::{InMemoryStore, PineconeStore, load_seed};
use tracing::info;

use crate::generator::ResponseGenerator;
use crate::pipeline::RagPipeline;

/// The retrieval half of the pipeline, ready to query.
pub struct Retrieval {
    pub encoder: Arc<ProbedEncoder>,
    pub store: Arc<dyn VectorStore>,
    pub index: IndexSpec,
}

/// Probe the encoder, build the configured store, and make sure the index
/// exists and is ready.
pub async fn prepare_retrieval(config: &AppConfig) -> Result<Retrieval> {
    let vs = &config.vector_store;
    if vs.backend == "pinecone" && vs.api_key.is_none() {
        return Err(ConfigError::MissingCredential {
            service: "vector store",
            env_var: VECTOR_STORE_KEY_ENV,
        }
        .into());
    }

    let encoder = build_encoder(&config.encoder)?;
    let encoder = Arc::new(ProbedEncoder::probe(encoder, &config.encoder.probe_text).await?);

    let index = IndexSpec {
        name: vs.index_name.clone(),
        dims: encoder.dims(),
        metric: vs.metric,
        cloud: vs.cloud.clone(),
        region: vs.region.clone(),
    };

    let store: Arc<dyn VectorStore> = match vs.backend.as_str() {
        "memory" => {
            let store = InMemoryStore::new();
            store.ensure_index(&index).await?;
            if let Some(path) = &vs.seed_path {
                let docs = load_seed(path)
                    .map_err(|e| groundwire_core::Error::config(e.to_string()))?;
                store.seed(&index.name, encoder.as_ref(), docs).await?;
            }
            Arc::new(store)
        }
        _ => {
            let store = PineconeStore::from_config(vs)?;
            if vs.create_if_missing {
                store.ensure_index(&index).await?;
            }
            Arc::new(store)
        }
    };

    info!(
        store = store.name(),
        index = %index.name,
        dims = index.dims,
        "Retrieval ready"
    );

    Ok(Retrieval {
        encoder,
        store,
        index,
    })
}

/// Build the full pipeline from configuration.
///
/// Fails with a configuration error before any network I/O if a required
/// credential is missing.
pub async fn bootstrap(config: &AppConfig) -> Result<RagPipeline> {
    config.require_credentials()?;

    let provider = build_provider(&config.generation)?;
    let retrieval = prepare_retrieval(config).await?;
    let generator = ResponseGenerator::from_config(provider, &config.generation);

    info!(
        provider = generator.provider_name(),
        model = %generator.model(),
        "Pipeline ready"
    );

    Ok(RagPipeline::new(retrieval.encoder, retrieval.store, retrieval.index.name, generator)
        .with_assembly(&config.assembly))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_vector_key_fails_before_probing() {
        let config = AppConfig::default();
        let err = prepare_retrieval(&config).await.err().unwrap();
        assert_eq!(err.kind(), "config");
        assert!(err.to_string().contains("PINECONE_API_KEY"));
    }

    #[tokio::test]
    async fn missing_generation_key_fails_bootstrap() {
        let mut config = AppConfig::default();
        config.vector_store.api_key = Some("pc-test".into());
        let err = bootstrap(&config).await.err().unwrap();
        assert_eq!(err.kind(), "config");
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[tokio::test]
    async fn memory_backend_only_needs_generation_key() {
        let mut config = AppConfig::default();
        config.vector_store.backend = "memory".into();
        let err = bootstrap(&config).await.err().unwrap();
        assert!(err.to_string().contains("GROQ_API_KEY"));
        assert!(!err.to_string().contains("PINECONE_API_KEY"));
    }
}
