//! In-memory vector store: useful for testing and offline runs.
//!
//! Ranks by plain cosine similarity. Nothing survives a restart.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use groundwire_core::error::VectorStoreError;
use groundwire_core::vector::{Document, IndexSpec, VectorStore, rank};
use groundwire_core::Encoder;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::similarity::cosine_similarity;

struct Record {
    id: String,
    content: String,
    vector: Vec<f32>,
}

struct MemoryIndex {
    dims: usize,
    records: Vec<Record>,
}

/// Texts per encoder request when seeding. text-embeddings-inference rejects
/// batches above its `max_client_batch_size`, which defaults to 32.
pub const SEED_BATCH_SIZE: usize = 32;

/// A document to load into the in-memory store at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedDocument {
    pub id: String,
    pub content: String,
}

/// Read seed documents from a JSON file of `[{"id", "content"}]`.
pub fn load_seed(path: &Path) -> Result<Vec<SeedDocument>, VectorStoreError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        VectorStoreError::MalformedResponse(format!("cannot read seed file {}: {e}", path.display()))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        VectorStoreError::MalformedResponse(format!("invalid seed file {}: {e}", path.display()))
    })
}

/// An in-process vector store keyed by index name.
pub struct InMemoryStore {
    indexes: Arc<RwLock<HashMap<String, MemoryIndex>>>,
    created: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            indexes: Arc::new(RwLock::new(HashMap::new())),
            created: AtomicUsize::new(0),
        }
    }

    /// How many indexes `ensure_index` actually created.
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Insert or replace a record in an existing index.
    pub async fn upsert(
        &self,
        index: &str,
        id: impl Into<String>,
        content: impl Into<String>,
        vector: Vec<f32>,
    ) -> Result<(), VectorStoreError> {
        let mut indexes = self.indexes.write().await;
        let idx = indexes
            .get_mut(index)
            .ok_or_else(|| VectorStoreError::IndexNotFound(index.to_string()))?;

        if vector.len() != idx.dims {
            return Err(VectorStoreError::DimensionMismatch {
                name: index.to_string(),
                expected: idx.dims,
                actual: vector.len(),
            });
        }

        let id = id.into();
        let record = Record {
            id: id.clone(),
            content: content.into(),
            vector,
        };
        match idx.records.iter_mut().find(|r| r.id == id) {
            Some(existing) => *existing = record,
            None => idx.records.push(record),
        }
        Ok(())
    }

    /// Encode each seed document and upsert it into `index`.
    pub async fn seed(
        &self,
        index: &str,
        encoder: &dyn Encoder,
        docs: Vec<SeedDocument>,
    ) -> groundwire_core::Result<usize> {
        let count = docs.len();
        for batch in docs.chunks(SEED_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|d| d.content.clone()).collect();
            let vectors = encoder.encode(&texts).await?;
            for (doc, vector) in batch.iter().zip(vectors) {
                self.upsert(index, doc.id.clone(), doc.content.clone(), vector)
                    .await?;
            }
            debug!(index, batch = batch.len(), "Seeded batch");
        }
        if count > 0 {
            info!(index, count, "Seeded in-memory index");
        }
        Ok(count)
    }

    /// Number of records in `index`, if it exists.
    pub async fn len(&self, index: &str) -> Option<usize> {
        self.indexes.read().await.get(index).map(|i| i.records.len())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn ensure_index(&self, spec: &IndexSpec) -> Result<(), VectorStoreError> {
        let mut indexes = self.indexes.write().await;
        match indexes.get(&spec.name) {
            Some(existing) if existing.dims != spec.dims => Err(VectorStoreError::DimensionMismatch {
                name: spec.name.clone(),
                expected: spec.dims,
                actual: existing.dims,
            }),
            Some(_) => {
                debug!(index = %spec.name, "Index already exists");
                Ok(())
            }
            None => {
                indexes.insert(
                    spec.name.clone(),
                    MemoryIndex {
                        dims: spec.dims,
                        records: Vec::new(),
                    },
                );
                self.created.fetch_add(1, Ordering::SeqCst);
                info!(index = %spec.name, dims = spec.dims, "Created in-memory index");
                Ok(())
            }
        }
    }

    async fn query(
        &self,
        index: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<Document>, VectorStoreError> {
        let indexes = self.indexes.read().await;
        let idx = indexes
            .get(index)
            .ok_or_else(|| VectorStoreError::IndexNotFound(index.to_string()))?;

        let scored = idx
            .records
            .iter()
            .map(|r| Document {
                id: r.id.clone(),
                content: r.content.clone(),
                score: cosine_similarity(&r.vector, vector),
            })
            .collect();

        Ok(rank(scored, top_k))
    }
}
