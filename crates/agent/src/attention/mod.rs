//! Attention mechanism: ordering retrieved memories by relevance.
//!
//! Every strategy returns a permutation of its input. Sorting is stable, so
//! equal scores keep the order the memory source returned them in.
//! Truncation happens in the pipeline, never here.

pub mod lexical;
pub mod passthrough;
pub mod vectorized;

use attune_core::embedding::Embedder;
use attune_core::error::EmbeddingError;
use attune_core::memory::Recallable;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A ranking strategy.
#[derive(Clone, Default)]
pub enum AttentionMechanism {
    /// Keep the source order.
    Passthrough,
    /// Query-term overlap.
    #[default]
    Lexical,
    /// Cosine similarity between the embedded query and stored embeddings.
    Vectorized(Arc<dyn Embedder>),
}

impl AttentionMechanism {
    pub fn vectorized(embedder: Arc<dyn Embedder>) -> Self {
        Self::Vectorized(embedder)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Passthrough => "passthrough",
            Self::Lexical => "lexical",
            Self::Vectorized(_) => "vectorized",
        }
    }

    /// Reorder `candidates` by relevance to `query`.
    ///
    /// Only the vectorized strategy can fail, when the query cannot be
    /// embedded. An empty candidate list never reaches the embedder.
    pub async fn rank<M>(&self, query: &str, candidates: Vec<M>) -> Result<Vec<M>, EmbeddingError>
    where
        M: Recallable + Send,
    {
        let ranked = match self {
            Self::Passthrough => passthrough::rank(query, candidates),
            Self::Lexical => lexical::rank(query, candidates),
            Self::Vectorized(embedder) => {
                if candidates.is_empty() {
                    return Ok(candidates);
                }
                let query_embedding = embedder.embed(query).await?;
                vectorized::rank(&query_embedding, candidates)
            }
        };
        debug!(strategy = self.name(), count = ranked.len(), "Candidates ranked");
        Ok(ranked)
    }
}

impl fmt::Debug for AttentionMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vectorized(embedder) => write!(f, "Vectorized({})", embedder.name()),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use attune_core::memory::{EpisodicMemory, SemanticMemory};
    use attune_memory::HashEmbedder;

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        fn name(&self) -> &str {
            "failing"
        }
        fn dimensions(&self) -> usize {
            4
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::Failed("offline".into()))
        }
    }

    fn texts(ranked: &[SemanticMemory]) -> Vec<&str> {
        ranked.iter().map(|m| m.text.as_str()).collect()
    }

    #[tokio::test]
    async fn passthrough_keeps_order() {
        let input = vec![
            SemanticMemory::new("1", "d", "A"),
            SemanticMemory::new("2", "d", "B"),
            SemanticMemory::new("3", "d", "C"),
        ];
        let ranked = AttentionMechanism::Passthrough.rank("C", input).await.unwrap();
        assert_eq!(texts(&ranked), vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn lexical_ranks_episodes_by_combined_text() {
        let input = vec![
            EpisodicMemory::now("u", "d", "hello", "hi there"),
            EpisodicMemory::now("u", "d", "what about invoice 999", "it is paid"),
        ];
        let ranked = AttentionMechanism::Lexical.rank("paid invoice", input).await.unwrap();
        assert_eq!(ranked[0].user_input, "what about invoice 999");
    }

    #[tokio::test]
    async fn vectorized_with_hash_embedder() {
        let embedder = HashEmbedder::new(64);
        let input = vec![
            SemanticMemory::new("1", "d", "product sku catalog")
                .with_embedding(embedder.embed_text("product sku catalog")),
            SemanticMemory::new("2", "d", "no embedding here"),
            SemanticMemory::new("3", "d", "invoice tax rules")
                .with_embedding(embedder.embed_text("invoice tax rules")),
        ];
        let mechanism = AttentionMechanism::vectorized(Arc::new(embedder));
        let ranked = mechanism.rank("invoice tax", input).await.unwrap();
        assert_eq!(ranked[0].id, "3");
        assert_eq!(ranked[2].id, "2");
    }

    #[tokio::test]
    async fn vectorized_skips_embedder_for_empty_input() {
        let mechanism = AttentionMechanism::vectorized(Arc::new(FailingEmbedder));
        let ranked = mechanism.rank::<SemanticMemory>("q", vec![]).await.unwrap();
        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn vectorized_surfaces_embedder_failure() {
        let mechanism = AttentionMechanism::vectorized(Arc::new(FailingEmbedder));
        let err = mechanism
            .rank("q", vec![SemanticMemory::new("1", "d", "x")])
            .await
            .unwrap_err();
        assert!(matches!(err, EmbeddingError::Failed(_)));
    }

    #[test]
    fn names() {
        assert_eq!(AttentionMechanism::default().name(), "lexical");
        assert_eq!(format!("{:?}", AttentionMechanism::Passthrough), "passthrough");
        let v = AttentionMechanism::vectorized(Arc::new(HashEmbedder::default()));
        assert_eq!(format!("{v:?}"), "Vectorized(hash)");
    }
}
