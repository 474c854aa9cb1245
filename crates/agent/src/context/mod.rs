//! Prompt construction for one call.
//!
//! | Piece | Source | Position |
//! |-------|--------|----------|
//! | History | Caller-supplied exchanges | First, oldest to newest |
//! | Context | Retrieved documents | After history |
//! | Query | Caller | Always last |

pub mod assembler;
pub mod history;

pub use assembler::{CONTEXT_HEADER, ContextAssembler};
pub use history::ConversationReconstructor;
