//! In-memory store: useful for testing and ephemeral sessions.
//!
//! Implements both [`MemorySource`] and [`SessionStore`] so a single value can
//! back a whole pipeline.

use async_trait::async_trait;
use attune_core::error::{MemoryError, SessionError};
use attune_core::memory::{EpisodicMemory, MemorySource, SemanticMemory};
use attune_core::session::SessionStore;
use attune_core::workspace::CognitiveWorkspace;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// First `top_k` semantic memories of a domain, in stored order.
pub(crate) fn select_semantic(
    entries: &[SemanticMemory],
    domain_id: &str,
    top_k: usize,
) -> Vec<SemanticMemory> {
    entries
        .iter()
        .filter(|m| m.domain_id == domain_id)
        .take(top_k)
        .cloned()
        .collect()
}

/// Last `last_n` turns of a user within a domain, oldest first.
pub(crate) fn select_episodic(
    log: &[EpisodicMemory],
    user_id: &str,
    domain_id: &str,
    last_n: usize,
) -> Vec<EpisodicMemory> {
    let matching: Vec<&EpisodicMemory> = log
        .iter()
        .filter(|e| e.user_id == user_id && e.domain_id == domain_id)
        .collect();
    let skip = matching.len().saturating_sub(last_n);
    matching.into_iter().skip(skip).cloned().collect()
}

/// Assign a fresh id to memories ingested without one.
pub(crate) fn ensure_id(memory: &mut SemanticMemory) {
    if memory.id.is_empty() {
        memory.id = Uuid::new_v4().to_string();
    }
}

#[derive(Default)]
struct Inner {
    semantic: Vec<SemanticMemory>,
    episodic: Vec<EpisodicMemory>,
    sessions: HashMap<String, CognitiveWorkspace>,
}

/// An in-memory store holding memories and workspaces in plain collections.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-ingest semantic memories.
    pub async fn import_semantic(&self, memories: Vec<SemanticMemory>) -> usize {
        let mut inner = self.inner.write().await;
        let count = memories.len();
        for mut memory in memories {
            ensure_id(&mut memory);
            inner.semantic.push(memory);
        }
        count
    }

    /// Number of logged episodic turns.
    pub async fn interaction_count(&self) -> usize {
        self.inner.read().await.episodic.len()
    }

    /// Number of stored workspaces.
    pub async fn workspace_count(&self) -> usize {
        self.inner.read().await.sessions.len()
    }
}

#[async_trait]
impl MemorySource for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_semantic_memories(
        &self,
        _query: &str,
        domain_id: &str,
        top_k: usize,
    ) -> Result<Vec<SemanticMemory>, MemoryError> {
        let inner = self.inner.read().await;
        Ok(select_semantic(&inner.semantic, domain_id, top_k))
    }

    async fn fetch_episodic_memories(
        &self,
        user_id: &str,
        domain_id: &str,
        last_n: usize,
    ) -> Result<Vec<EpisodicMemory>, MemoryError> {
        let inner = self.inner.read().await;
        Ok(select_episodic(&inner.episodic, user_id, domain_id, last_n))
    }

    async fn log_interaction(&self, interaction: EpisodicMemory) -> Result<(), MemoryError> {
        self.inner.write().await.episodic.push(interaction);
        Ok(())
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn get_workspace(&self, user_id: &str) -> Result<Option<CognitiveWorkspace>, SessionError> {
        Ok(self.inner.read().await.sessions.get(user_id).cloned())
    }

    async fn save_workspace(&self, workspace: &CognitiveWorkspace) -> Result<(), SessionError> {
        self.inner
            .write()
            .await
            .sessions
            .insert(workspace.user_id.clone(), workspace.clone());
        Ok(())
    }
}
