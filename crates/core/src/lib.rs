//! # Groundwire Core
//!
//! Domain types, traits, and error definitions for the Groundwire
//! retrieval-augmented chat core. This crate has **no I/O dependencies**;
//! it defines the domain model that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Each external collaborator is a trait here:
//! - [`Encoder`]: text to fixed-dimension vectors
//! - [`VectorStore`]: index management and top-k similarity queries
//! - [`Provider`]: chat completion over an ordered message sequence
//!
//! Implementations live in their respective crates, so the pipeline can be
//! wired against real services in production and scripted doubles in tests.

pub mod encoder;
pub mod error;
pub mod message;
pub mod provider;
pub mod vector;

// Re-export key types at crate root for ergonomics
pub use encoder::Encoder;
pub use error::{Error, Result};
pub use message::{Exchange, Message, MessageSequence, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use vector::{Document, IndexSpec, Metric, VectorStore};
