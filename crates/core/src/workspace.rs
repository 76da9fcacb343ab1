//! Cognitive workspace: per-user, multi-domain conversational state.
//!
//! One workspace per user is the unit of persistence. It holds one
//! [`DomainState`] for every domain the user has ever touched; at most one of
//! them is `Active` and `current_focus` names it.
//!
//! These are plain typed records: storage backends deserialize straight into
//! them, so nothing downstream ever sees an untyped map standing in for a
//! domain state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::memory::{EpisodicMemory, SemanticMemory};

/// Lifecycle of a domain inside a workspace. There is no terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainStatus {
    Active,
    #[default]
    Paused,
}

/// Everything remembered about one domain for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainState {
    pub status: DomainStatus,

    /// Running summary of the conversation in this domain
    pub session_summary: String,

    /// What the assistant is currently working on
    pub active_task: String,

    /// Ranked, truncated semantic memories from the last request
    pub semantic_memories: Vec<SemanticMemory>,

    /// Ranked, truncated episodic memories from the last request
    pub episodic_memories: Vec<EpisodicMemory>,

    /// Summarised auxiliary payload for the current task
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_data: Option<serde_json::Value>,
}

impl DomainState {
    pub fn is_active(&self) -> bool {
        self.status == DomainStatus::Active
    }
}

/// A user's whole cognitive workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CognitiveWorkspace {
    pub user_id: String,

    /// The active domain. `None` only on a freshly created workspace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_focus: Option<String>,

    /// Every domain ever visited, keyed by domain id. Never shrinks.
    #[serde(default)]
    pub active_domains: BTreeMap<String, DomainState>,
}

impl CognitiveWorkspace {
    /// A fresh, empty workspace with no focus.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            current_focus: None,
            active_domains: BTreeMap::new(),
        }
    }

    /// State of the focused domain.
    pub fn focused(&self) -> Option<&DomainState> {
        self.current_focus
            .as_deref()
            .and_then(|id| self.active_domains.get(id))
    }

    /// Mutable state of the focused domain.
    pub fn focused_mut(&mut self) -> Option<&mut DomainState> {
        let id = self.current_focus.as_deref()?;
        self.active_domains.get_mut(id)
    }

    /// Ids of domains currently marked `Active`.
    pub fn active_ids(&self) -> Vec<&str> {
        self.active_domains
            .iter()
            .filter(|(_, state)| state.is_active())
            .map(|(id, _)| id.as_str())
            .collect()
    }
}
