//! Vector store trait: similarity index management and top-k retrieval.
//!
//! The store owns ranking. The core only consumes the ranked list, so the
//! trait contract is about ordering and bounds, not about how scores are
//! computed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::VectorStoreError;

/// A retrieved snippet and its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Identifier of the matching record in the store
    #[serde(default)]
    pub id: String,

    /// The snippet text
    pub content: String,

    /// Similarity score (higher is more similar)
    pub score: f32,
}

/// Similarity metric of an index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
    Dotproduct,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
            Self::Dotproduct => "dotproduct",
        }
    }
}

/// Everything needed to create an index if it does not exist yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Index name (unique per store)
    pub name: String,

    /// Vector dimensionality, taken from the encoder probe
    pub dims: usize,

    /// Similarity metric
    #[serde(default)]
    pub metric: Metric,

    /// Serverless cloud
    pub cloud: String,

    /// Serverless region
    pub region: String,
}

/// The core VectorStore trait.
///
/// Implementations: Pinecone (REST), in-memory (offline runs and tests).
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// The backend name (e.g., "pinecone", "in_memory").
    fn name(&self) -> &str;

    /// Create the index described by `spec` unless one with that name exists,
    /// then wait until it reports ready. Calling this twice is a no-op the
    /// second time.
    async fn ensure_index(&self, spec: &IndexSpec) -> std::result::Result<(), VectorStoreError>;

    /// Return at most `top_k` documents ordered by non-increasing score.
    ///
    /// No matches is an empty vector, not an error.
    async fn query(
        &self,
        index: &str,
        vector: &[f32],
        top_k: usize,
    ) -> std::result::Result<Vec<Document>, VectorStoreError>;
}

/// Sort by descending score and keep the first `top_k`.
///
/// Stores call this on whatever the backend returned so the ordering
/// contract holds even if the service misbehaves. NaN scores sort last.
pub fn rank(mut docs: Vec<Document>, top_k: usize) -> Vec<Document> {
    let key = |d: &Document| if d.score.is_nan() { f32::NEG_INFINITY } else { d.score };
    docs.sort_by(|a, b| key(b).total_cmp(&key(a)));
    docs.truncate(top_k);
    docs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, score: f32) -> Document {
        Document {
            id: id.into(),
            content: format!("content {id}"),
            score,
        }
    }

    #[test]
    fn metric_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Metric::Cosine).unwrap(), "\"cosine\"");
        assert_eq!(Metric::Dotproduct.as_str(), "dotproduct");
    }

    #[test]
    fn rank_sorts_and_truncates() {
        let ranked = rank(vec![doc("a", 0.2), doc("b", 0.9), doc("c", 0.5)], 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id, "b");
        assert_eq!(ranked[1].id, "c");
    }

    #[test]
    fn rank_puts_nan_scores_last() {
        let ranked = rank(
            vec![doc("a", f32::NAN), doc("b", 0.3), doc("c", 0.8), doc("d", f32::NAN)],
            4,
        );
        assert_eq!(ranked[0].id, "c");
        assert_eq!(ranked[1].id, "b");
        assert!(ranked[2].score.is_nan());
        assert!(ranked[3].score.is_nan());
    }

    #[test]
    fn rank_of_nothing_is_nothing() {
        assert!(rank(Vec::new(), 5).is_empty());
    }
}
