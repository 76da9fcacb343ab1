//! Feature-hashing embedder: deterministic, model-free vectors.
//!
//! Each case-folded alphanumeric token is hashed (FNV-1a) into one of
//! `dimensions` buckets; the bucket counts are L2-normalised. Texts that share
//! vocabulary get a positive cosine similarity, which is enough for offline
//! use and tests. Swap in a real model behind [`Embedder`] for production.

use async_trait::async_trait;
use attune_core::embedding::Embedder;
use attune_core::error::EmbeddingError;

use crate::vector::l2_normalize;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

pub struct HashEmbedder {
    dims: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dims: dimensions.max(1) }
    }

    /// Synchronous embedding, shared by the async trait impl and ingestion.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dims];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = (fnv1a(&token.to_lowercase()) % self.dims as u64) as usize;
            v[bucket] += 1.0;
        }
        l2_normalize(&mut v);
        v
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

fn fnv1a(s: &str) -> u64 {
    s.bytes()
        .fold(FNV_OFFSET, |hash, b| (hash ^ b as u64).wrapping_mul(FNV_PRIME))
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn name(&self) -> &str {
        "hash"
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.embed_text(text))
    }
}
