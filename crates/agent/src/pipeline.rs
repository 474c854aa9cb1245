//! The retrieval-augmented generation pipeline.
//!
//! # Flow
//!
//! 1. Encode the query
//! 2. Retrieve the top-k documents from the index
//! 3. Build the context system message (first-turn or follow-up shape)
//! 4. Reconstruct history and place the context after it
//! 5. Append the query and generate
//!
//! The pipeline holds no conversation state. Concurrent calls share the
//! collaborators behind `Arc` and never touch each other's history.

use std::sync::Arc;

use groundwire_config::AssemblyConfig;
use groundwire_core::message::{Exchange, MessageSequence};
use groundwire_core::vector::{Document, VectorStore};
use groundwire_core::{Encoder, Result};
use tracing::{debug, info};

use crate::context::{ContextAssembler, ConversationReconstructor};
use crate::generator::ResponseGenerator;

pub struct RagPipeline {
    encoder: Arc<dyn Encoder>,
    store: Arc<dyn VectorStore>,
    index: String,
    assembler: ContextAssembler,
    reconstructor: ConversationReconstructor,
    generator: ResponseGenerator,
}

impl RagPipeline {
    /// Create a pipeline with default assembly settings.
    pub fn new(
        encoder: Arc<dyn Encoder>,
        store: Arc<dyn VectorStore>,
        index: impl Into<String>,
        generator: ResponseGenerator,
    ) -> Self {
        Self {
            encoder,
            store,
            index: index.into(),
            assembler: ContextAssembler::default(),
            reconstructor: ConversationReconstructor::default(),
            generator,
        }
    }

    /// Use persona, preface, top-k, delimiter and history mode from `config`.
    pub fn with_assembly(mut self, config: &AssemblyConfig) -> Self {
        self.assembler = ContextAssembler::new(config);
        self.reconstructor = ConversationReconstructor::new(config.history_mode);
        self
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn generator(&self) -> &ResponseGenerator {
        &self.generator
    }

    /// Encode `query` and fetch the ranked documents for it.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<Document>> {
        let vector = self.encoder.encode_one(query).await?;
        let docs = self
            .store
            .query(&self.index, &vector, self.assembler.top_k())
            .await?;
        debug!(index = %self.index, docs = docs.len(), "Retrieved documents");
        Ok(docs)
    }

    /// Build the full message sequence for one call without generating.
    pub async fn assemble(&self, query: &str, history: &[Exchange]) -> Result<MessageSequence> {
        let docs = self.retrieve(query).await?;
        let first_turn = history.is_empty();

        let mut preamble = self.reconstructor.reconstruct(history);
        preamble.push(self.assembler.assemble(&docs, first_turn));

        Ok(MessageSequence::new(preamble, query))
    }

    /// Answer `query` given the caller's `history`.
    pub async fn generate(&self, query: &str, history: &[Exchange]) -> Result<String> {
        let sequence = self.assemble(query, history).await?;

        info!(
            model = %self.generator.model(),
            history = history.len(),
            history_mode = ?self.reconstructor.mode(),
            messages = sequence.len(),
            "Generating response"
        );

        self.generator.generate(sequence).await
    }
}
