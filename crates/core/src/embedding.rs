//! Embedding provider seam used by vector ranking.

use async_trait::async_trait;

use crate::error::EmbeddingError;

/// Turns text into a dense vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Provider name for diagnostics.
    fn name(&self) -> &str;

    /// Dimensionality of produced vectors.
    fn dimensions(&self) -> usize;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}
