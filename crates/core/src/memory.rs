//! Memory records and the memory-source collaborator.
//!
//! Two streams of memory feed a context:
//! - **Semantic**: long-term, domain-scoped facts and rules, optionally embedded
//! - **Episodic**: one record per conversational turn, append-only
//!
//! Both are immutable once stored. This crate only reads them; ingestion and
//! persistence belong to the [`MemorySource`] implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

use crate::error::MemoryError;

/// A long-term fact or rule scoped to one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticMemory {
    /// Unique ID for this memory; assigned on import when empty
    #[serde(default)]
    pub id: String,

    /// The domain this memory belongs to
    pub domain_id: String,

    /// Free-form category ("rule", "fact", "procedure", ...)
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Human-readable content
    #[serde(rename = "text_content")]
    pub text: String,

    /// Optional embedding vector for similarity ranking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// Arbitrary attributes attached at ingestion
    #[serde(rename = "metadata", default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl SemanticMemory {
    pub fn new(id: impl Into<String>, domain_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            domain_id: domain_id.into(),
            kind: "fact".into(),
            text: text.into(),
            embedding: None,
            attributes: HashMap::new(),
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// One recorded conversational turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodicMemory {
    pub user_id: String,
    pub domain_id: String,
    pub user_input: String,
    pub assistant_output: String,
    pub timestamp: DateTime<Utc>,
}

impl EpisodicMemory {
    /// Record a turn that happened now.
    pub fn now(
        user_id: impl Into<String>,
        domain_id: impl Into<String>,
        user_input: impl Into<String>,
        assistant_output: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            domain_id: domain_id.into(),
            user_input: user_input.into(),
            assistant_output: assistant_output.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Anything the ranking engine can score.
pub trait Recallable {
    /// The text a lexical ranker matches against.
    fn recall_text(&self) -> Cow<'_, str>;

    /// The stored embedding, if any.
    fn embedding(&self) -> Option<&[f32]> {
        None
    }
}

impl Recallable for SemanticMemory {
    fn recall_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.text)
    }

    fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }
}

impl Recallable for EpisodicMemory {
    fn recall_text(&self) -> Cow<'_, str> {
        Cow::Owned(format!("{} {}", self.user_input, self.assistant_output))
    }
}

/// The memory collaborator.
///
/// Implementations: in-memory (for testing), JSON files, SQLite, none (no-op).
#[async_trait]
pub trait MemorySource: Send + Sync {
    /// The backend name (e.g., "file", "sqlite", "none").
    fn name(&self) -> &str;

    /// Candidate semantic memories for a query within one domain.
    async fn fetch_semantic_memories(
        &self,
        query: &str,
        domain_id: &str,
        top_k: usize,
    ) -> std::result::Result<Vec<SemanticMemory>, MemoryError>;

    /// The last `last_n` turns of a user within one domain, oldest first.
    async fn fetch_episodic_memories(
        &self,
        user_id: &str,
        domain_id: &str,
        last_n: usize,
    ) -> std::result::Result<Vec<EpisodicMemory>, MemoryError>;

    /// Append one turn to the episodic log.
    async fn log_interaction(&self, interaction: EpisodicMemory) -> std::result::Result<(), MemoryError>;
}
