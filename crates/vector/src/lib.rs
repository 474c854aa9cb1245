//! Vector store implementations for Groundwire.

pub mod in_memory;
pub mod pinecone;
pub mod readiness;
pub mod similarity;

pub use in_memory::{InMemoryStore, SeedDocument, load_seed};
pub use pinecone::{IndexDescription, IndexStats, PineconeStore};
pub use readiness::ReadinessPolicy;
pub use similarity::cosine_similarity;
