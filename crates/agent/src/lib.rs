//! The retrieval-augmented chat pipeline: the heart of Groundwire.
//!
//! Every call follows the same sequence:
//!
//! 1. **Encode** the user query
//! 2. **Retrieve** the top-k documents for it
//! 3. **Assemble** the context system message (persona on the first turn,
//!    a short preface afterwards)
//! 4. **Reconstruct** the caller's history and place the context after it
//! 5. **Generate** a response from the ordered message sequence
//!
//! The caller owns the conversation; nothing is remembered between calls.

pub mod bootstrap;
pub mod context;
pub mod generator;
pub mod pipeline;

#[cfg(test)]
mod test_helpers;

pub use bootstrap::{Retrieval, bootstrap, prepare_retrieval};
pub use context::{ContextAssembler, ConversationReconstructor};
pub use generator::ResponseGenerator;
pub use pipeline::RagPipeline;
