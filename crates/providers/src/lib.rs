//! Model service adapters for Groundwire.
//!
//! Chat-completion providers implement `groundwire_core::Provider`, embedding
//! adapters implement `groundwire_core::Encoder`. The router builds both from
//! configuration.

pub mod embedding;
pub mod openai_compat;
pub mod router;

pub use embedding::{EncoderBackend, HttpEncoder, ProbedEncoder};
pub use openai_compat::OpenAiCompatProvider;
pub use router::{build_encoder, build_provider};
