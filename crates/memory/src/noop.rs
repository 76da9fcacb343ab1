//! No-op memory source: disables long-term and episodic recall entirely.

use async_trait::async_trait;
use attune_core::error::MemoryError;
use attune_core::memory::{EpisodicMemory, MemorySource, SemanticMemory};

/// A memory source that returns nothing and discards interactions.
pub struct NoopMemory;

#[async_trait]
impl MemorySource for NoopMemory {
    fn name(&self) -> &str {
        "none"
    }

    async fn fetch_semantic_memories(
        &self,
        _query: &str,
        _domain_id: &str,
        _top_k: usize,
    ) -> Result<Vec<SemanticMemory>, MemoryError> {
        Ok(Vec::new())
    }

    async fn fetch_episodic_memories(
        &self,
        _user_id: &str,
        _domain_id: &str,
        _last_n: usize,
    ) -> Result<Vec<EpisodicMemory>, MemoryError> {
        Ok(Vec::new())
    }

    async fn log_interaction(&self, _interaction: EpisodicMemory) -> Result<(), MemoryError> {
        Ok(())
    }
}
