//! File-based store: human-inspectable JSON storage in one directory.
//!
//! Layout under the data directory:
//! - `memories.json`: array of semantic memories
//! - `interaction_log.jsonl`: one JSON-encoded episodic turn per line, append-only
//! - `sessions.json`: object mapping user id to workspace
//!
//! Everything is loaded into memory on creation. Missing or empty files start
//! empty; unreadable records are skipped with a warning. Workspaces are
//! flushed on every save, turns are appended on every log.

use async_trait::async_trait;
use attune_core::error::{MemoryError, SessionError};
use attune_core::memory::{EpisodicMemory, MemorySource, SemanticMemory};
use attune_core::session::SessionStore;
use attune_core::workspace::CognitiveWorkspace;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::in_memory::{ensure_id, select_episodic, select_semantic};

pub const SEMANTIC_FILE: &str = "memories.json";
pub const EPISODIC_FILE: &str = "interaction_log.jsonl";
pub const SESSIONS_FILE: &str = "sessions.json";

struct State {
    semantic: Vec<SemanticMemory>,
    episodic: Vec<EpisodicMemory>,
    sessions: BTreeMap<String, CognitiveWorkspace>,
}

/// A directory-backed store for memories and workspaces.
pub struct FileStore {
    dir: PathBuf,
    state: Arc<RwLock<State>>,
}

impl FileStore {
    /// Open a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let state = State {
            semantic: load_semantic(&dir.join(SEMANTIC_FILE)),
            episodic: load_episodic(&dir.join(EPISODIC_FILE)),
            sessions: load_sessions(&dir.join(SESSIONS_FILE)),
        };
        debug!(
            dir = %dir.display(),
            semantic = state.semantic.len(),
            episodic = state.episodic.len(),
            sessions = state.sessions.len(),
            "File store loaded"
        );
        Self {
            dir,
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Bulk-ingest semantic memories and rewrite `memories.json`.
    pub async fn import_semantic(&self, memories: Vec<SemanticMemory>) -> Result<usize, MemoryError> {
        let mut state = self.state.write().await;
        let count = memories.len();
        for mut memory in memories {
            ensure_id(&mut memory);
            state.semantic.push(memory);
        }
        let json = serde_json::to_string_pretty(&state.semantic)
            .map_err(|e| MemoryError::Storage(format!("Failed to serialize memories: {e}")))?;
        self.write_file(SEMANTIC_FILE, &json)
            .map_err(MemoryError::Storage)?;
        Ok(count)
    }

    fn ensure_dir(&self) -> Result<(), String> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| format!("Failed to create data directory {}: {e}", self.dir.display()))
    }

    fn write_file(&self, name: &str, content: &str) -> Result<(), String> {
        self.ensure_dir()?;
        let path = self.dir.join(name);
        std::fs::write(&path, content).map_err(|e| format!("Failed to write {}: {e}", path.display()))
    }
}

fn read_optional(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) if !content.trim().is_empty() => Some(content),
        _ => None,
    }
}

fn load_semantic(path: &Path) -> Vec<SemanticMemory> {
    let Some(content) = read_optional(path) else {
        return Vec::new();
    };
    match serde_json::from_str(&content) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable semantic memory file");
            Vec::new()
        }
    }
}

fn load_episodic(path: &Path) -> Vec<EpisodicMemory> {
    let Some(content) = read_optional(path) else {
        return Vec::new();
    };
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<EpisodicMemory>(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Skipping corrupted interaction log line");
                None
            }
        })
        .collect()
}

fn load_sessions(path: &Path) -> BTreeMap<String, CognitiveWorkspace> {
    let Some(content) = read_optional(path) else {
        return BTreeMap::new();
    };
    let raw: BTreeMap<String, serde_json::Value> = match serde_json::from_str(&content) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable sessions file");
            return BTreeMap::new();
        }
    };
    raw.into_iter()
        .filter_map(|(user_id, value)| match serde_json::from_value(value) {
            Ok(workspace) => Some((user_id, workspace)),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Skipping corrupted workspace");
                None
            }
        })
        .collect()
}

#[async_trait]
impl MemorySource for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch_semantic_memories(
        &self,
        _query: &str,
        domain_id: &str,
        top_k: usize,
    ) -> Result<Vec<SemanticMemory>, MemoryError> {
        let state = self.state.read().await;
        Ok(select_semantic(&state.semantic, domain_id, top_k))
    }

    async fn fetch_episodic_memories(
        &self,
        user_id: &str,
        domain_id: &str,
        last_n: usize,
    ) -> Result<Vec<EpisodicMemory>, MemoryError> {
        let state = self.state.read().await;
        Ok(select_episodic(&state.episodic, user_id, domain_id, last_n))
    }

    async fn log_interaction(&self, interaction: EpisodicMemory) -> Result<(), MemoryError> {
        let mut state = self.state.write().await;
        let line = serde_json::to_string(&interaction)
            .map_err(|e| MemoryError::Storage(format!("Failed to serialize interaction: {e}")))?;

        self.ensure_dir().map_err(MemoryError::Storage)?;
        let path = self.dir.join(EPISODIC_FILE);
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| MemoryError::Storage(format!("Failed to open {}: {e}", path.display())))?;
        writeln!(file, "{line}")
            .map_err(|e| MemoryError::Storage(format!("Failed to append interaction: {e}")))?;

        state.episodic.push(interaction);
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileStore {
    async fn get_workspace(&self, user_id: &str) -> Result<Option<CognitiveWorkspace>, SessionError> {
        Ok(self.state.read().await.sessions.get(user_id).cloned())
    }

    async fn save_workspace(&self, workspace: &CognitiveWorkspace) -> Result<(), SessionError> {
        let mut state = self.state.write().await;
        let mut sessions = state.sessions.clone();
        sessions.insert(workspace.user_id.clone(), workspace.clone());

        let json = serde_json::to_string_pretty(&sessions).map_err(|e| SessionError::SaveFailed {
            user_id: workspace.user_id.clone(),
            reason: e.to_string(),
        })?;
        self.write_file(SESSIONS_FILE, &json)
            .map_err(|reason| SessionError::SaveFailed {
                user_id: workspace.user_id.clone(),
                reason,
            })?;

        // Only commit in memory once the file is written
        state.sessions = sessions;
        debug!(user_id = %workspace.user_id, "Workspace saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attune_core::workspace::DomainStatus;

    #[tokio::test]
    async fn workspace_round_trip_persists() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path());

        let mut ws = CognitiveWorkspace::new("u1");
        ws.current_focus = Some("fiscal".into());
        ws.active_domains.insert("fiscal".into(), Default::default());
        ws.active_domains.get_mut("fiscal").unwrap().status = DomainStatus::Active;
        store.save_workspace(&ws).await.unwrap();

        let reopened = FileStore::new(tmp.path());
        let loaded = reopened.get_workspace("u1").await.unwrap().unwrap();
        assert_eq!(loaded, ws);
    }

    #[tokio::test]
    async fn interactions_append_and_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path());
        store
            .log_interaction(EpisodicMemory::now("u1", "fiscal", "first", "one"))
            .await
            .unwrap();
        store
            .log_interaction(EpisodicMemory::now("u1", "fiscal", "second", "two"))
            .await
            .unwrap();

        let content = std::fs::read_to_string(tmp.path().join(EPISODIC_FILE)).unwrap();
        assert_eq!(content.lines().count(), 2);

        let reopened = FileStore::new(tmp.path());
        let turns = reopened.fetch_episodic_memories("u1", "fiscal", 5).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].user_input, "first");
    }

    #[tokio::test]
    async fn import_semantic_persists() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path());
        let n = store
            .import_semantic(vec![SemanticMemory::new("m1", "fiscal", "ICMS rule")])
            .await
            .unwrap();
        assert_eq!(n, 1);

        let reopened = FileStore::new(tmp.path());
        let found = reopened.fetch_semantic_memories("", "fiscal", 3).await.unwrap();
        assert_eq!(found[0].text, "ICMS rule");
    }

    #[tokio::test]
    async fn missing_directory_starts_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path().join("not-yet"));
        assert!(store.get_workspace("u1").await.unwrap().is_none());
        assert!(store.fetch_semantic_memories("", "fiscal", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupted_records_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join(EPISODIC_FILE),
            concat!(
                r#"{"user_id":"u1","domain_id":"fiscal","user_input":"ok","assistant_output":"fine","timestamp":"2026-01-01T00:00:00Z"}"#,
                "\nthis is not json\n"
            ),
        )
        .unwrap();
        std::fs::write(
            tmp.path().join(SESSIONS_FILE),
            r#"{"u1": {"user_id": "u1"}, "u2": {"active_domains": 7}}"#,
        )
        .unwrap();
        std::fs::write(tmp.path().join(SEMANTIC_FILE), "").unwrap();

        let store = FileStore::new(tmp.path());
        assert_eq!(store.fetch_episodic_memories("u1", "fiscal", 5).await.unwrap().len(), 1);
        assert!(store.get_workspace("u1").await.unwrap().is_some());
        assert!(store.get_workspace("u2").await.unwrap().is_none());
    }
}
