//! Context assembly: turns retrieved documents into the system message.
//!
//! Two shapes:
//!
//! 1. **First turn** (no history): persona block, a blank line, then
//!    `CONTEXT:` and the retrieved snippets.
//! 2. **Follow-up turn**: a short preface instead of the persona, same
//!    `CONTEXT:` block built from documents retrieved for the newest query.
//!
//! Assembly is deterministic: identical inputs always produce identical
//! output.

use groundwire_config::AssemblyConfig;
use groundwire_core::message::Message;
use groundwire_core::vector::Document;

/// Header line that introduces the retrieved snippets.
pub const CONTEXT_HEADER: &str = "CONTEXT:\n";

/// Builds the context-bearing system message for one call.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    persona: String,
    followup_preface: String,
    delimiter: String,
    top_k: usize,
}

impl ContextAssembler {
    pub fn new(config: &AssemblyConfig) -> Self {
        Self {
            persona: config.persona.clone(),
            followup_preface: config.followup_preface.clone(),
            delimiter: config.delimiter.clone(),
            top_k: config.top_k,
        }
    }

    /// Number of documents to retrieve and include.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Join at most `top_k` document contents with the delimiter.
    ///
    /// Documents are used in the order given; the store already ranked them.
    pub fn join_documents(&self, docs: &[Document]) -> String {
        docs.iter()
            .take(self.top_k)
            .map(|d| d.content.as_str())
            .collect::<Vec<_>>()
            .join(&self.delimiter)
    }

    /// System message for a conversation with no prior turns.
    pub fn first_turn(&self, docs: &[Document]) -> Message {
        Message::system(self.with_context(&self.persona, docs))
    }

    /// System message appended after history on later turns.
    pub fn followup(&self, docs: &[Document]) -> Message {
        Message::system(self.with_context(&self.followup_preface, docs))
    }

    /// Pick the right shape for whether this is the first turn.
    pub fn assemble(&self, docs: &[Document], first_turn: bool) -> Message {
        if first_turn {
            self.first_turn(docs)
        } else {
            self.followup(docs)
        }
    }

    fn with_context(&self, lead: &str, docs: &[Document]) -> String {
        format!("{lead}\n\n{CONTEXT_HEADER}{}", self.join_documents(docs))
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(&AssemblyConfig::default())
    }
}
