//! Workspace manager: loading workspaces and moving focus between domains.
//!
//! Focus switching is a pure transformation on an in-memory workspace.
//! Persisting the result is the caller's responsibility, so a request that
//! fails or is cancelled midway leaves the stored record untouched.

use attune_core::error::SessionError;
use attune_core::session::SessionStore;
use attune_core::workspace::{CognitiveWorkspace, DomainState, DomainStatus};
use tracing::{debug, info};

/// Result of a focus switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusChange {
    /// Focus before the switch.
    pub previous: Option<String>,
    /// Whether the target domain was seen for the first time.
    pub created: bool,
}

impl FocusChange {
    /// True when focus moved to a different domain.
    pub fn moved(&self, target: &str) -> bool {
        self.previous.as_deref() != Some(target)
    }
}

pub struct WorkspaceManager;

impl WorkspaceManager {
    /// Fetch the stored workspace, or start an empty one for a new user.
    pub async fn load_or_create(
        store: &dyn SessionStore,
        user_id: &str,
    ) -> Result<CognitiveWorkspace, SessionError> {
        match store.get_workspace(user_id).await? {
            Some(mut workspace) => {
                if workspace.user_id != user_id {
                    debug!(stored = %workspace.user_id, user_id, "Rebinding workspace to requested user");
                    workspace.user_id = user_id.to_string();
                }
                Ok(workspace)
            }
            None => {
                info!(user_id, "Creating new workspace");
                Ok(CognitiveWorkspace::new(user_id))
            }
        }
    }

    /// Make `target` the single active domain.
    ///
    /// Every other domain that is still marked active (normally just the
    /// previous focus) is paused. Paused domains keep their summary, task,
    /// memories, and task data exactly as they were. A domain seen for the
    /// first time starts from an empty state. Switching to the current
    /// focus is idempotent.
    pub fn switch_focus(workspace: &mut CognitiveWorkspace, target: &str) -> FocusChange {
        let previous = workspace.current_focus.take();

        for (id, state) in workspace.active_domains.iter_mut() {
            if id != target && state.status == DomainStatus::Active {
                state.status = DomainStatus::Paused;
            }
        }

        let created = !workspace.active_domains.contains_key(target);
        workspace
            .active_domains
            .entry(target.to_string())
            .or_insert_with(DomainState::default)
            .status = DomainStatus::Active;
        workspace.current_focus = Some(target.to_string());

        let change = FocusChange { previous, created };
        if change.moved(target) {
            info!(
                user_id = %workspace.user_id,
                from = change.previous.as_deref().unwrap_or("-"),
                to = target,
                created,
                "Focus switched"
            );
        }
        change
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attune_core::memory::SemanticMemory;
    use attune_memory::InMemoryStore;

    fn assert_single_focus(ws: &CognitiveWorkspace) {
        let active = ws.active_ids();
        match ws.current_focus.as_deref() {
            Some(focus) => assert_eq!(active, vec![focus]),
            None => assert!(active.is_empty()),
        }
    }

    #[tokio::test]
    async fn load_or_create_new_user() {
        let store = InMemoryStore::new();
        let ws = WorkspaceManager::load_or_create(&store, "u1").await.unwrap();
        assert_eq!(ws.user_id, "u1");
        assert!(ws.current_focus.is_none());
        assert!(ws.active_domains.is_empty());
    }

    #[tokio::test]
    async fn load_or_create_returns_stored_workspace() {
        let store = InMemoryStore::new();
        let mut ws = CognitiveWorkspace::new("u1");
        WorkspaceManager::switch_focus(&mut ws, "fiscal");
        store.save_workspace(&ws).await.unwrap();

        let loaded = WorkspaceManager::load_or_create(&store, "u1").await.unwrap();
        assert_eq!(loaded, ws);
    }

    #[test]
    fn first_focus_creates_active_domain() {
        let mut ws = CognitiveWorkspace::new("u1");
        let change = WorkspaceManager::switch_focus(&mut ws, "fiscal");

        assert_eq!(change.previous, None);
        assert!(change.created);
        assert_eq!(ws.current_focus.as_deref(), Some("fiscal"));
        assert!(ws.active_domains["fiscal"].is_active());
        assert_single_focus(&ws);
    }

    #[test]
    fn switching_pauses_previous_and_preserves_it() {
        let mut ws = CognitiveWorkspace::new("u1");
        WorkspaceManager::switch_focus(&mut ws, "fiscal");
        {
            let fiscal = ws.focused_mut().unwrap();
            fiscal.session_summary = "discussing invoice 999".into();
            fiscal.active_task = "check invoice".into();
            fiscal.semantic_memories = vec![SemanticMemory::new("m1", "fiscal", "ICMS rule")];
            fiscal.task_data = Some(serde_json::json!({"total": 10}));
        }
        let before = ws.active_domains["fiscal"].clone();

        let change = WorkspaceManager::switch_focus(&mut ws, "product_catalog");
        assert_eq!(change.previous.as_deref(), Some("fiscal"));
        assert!(change.moved("product_catalog"));

        let fiscal = &ws.active_domains["fiscal"];
        assert_eq!(fiscal.status, DomainStatus::Paused);
        assert_eq!(fiscal.session_summary, before.session_summary);
        assert_eq!(fiscal.active_task, before.active_task);
        assert_eq!(fiscal.semantic_memories, before.semantic_memories);
        assert_eq!(fiscal.task_data, before.task_data);
        assert_single_focus(&ws);
    }

    #[test]
    fn returning_to_a_paused_domain_reactivates_it() {
        let mut ws = CognitiveWorkspace::new("u1");
        WorkspaceManager::switch_focus(&mut ws, "fiscal");
        ws.focused_mut().unwrap().session_summary = "kept".into();
        WorkspaceManager::switch_focus(&mut ws, "product_catalog");

        let change = WorkspaceManager::switch_focus(&mut ws, "fiscal");
        assert!(!change.created);
        assert_eq!(ws.focused().unwrap().session_summary, "kept");
        assert_eq!(ws.active_domains["product_catalog"].status, DomainStatus::Paused);
        assert_single_focus(&ws);
    }

    #[test]
    fn switching_to_current_focus_is_idempotent() {
        let mut ws = CognitiveWorkspace::new("u1");
        WorkspaceManager::switch_focus(&mut ws, "fiscal");
        let snapshot = ws.clone();

        let change = WorkspaceManager::switch_focus(&mut ws, "fiscal");
        assert!(!change.moved("fiscal"));
        assert_eq!(ws, snapshot);
    }

    #[test]
    fn domains_are_never_removed() {
        let mut ws = CognitiveWorkspace::new("u1");
        for target in ["a", "b", "c", "a", "d", "b"] {
            WorkspaceManager::switch_focus(&mut ws, target);
            assert_single_focus(&ws);
        }
        let ids: Vec<&str> = ws.active_domains.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn repairs_workspace_with_several_active_domains() {
        let mut ws = CognitiveWorkspace::new("u1");
        for id in ["a", "b"] {
            ws.active_domains.insert(
                id.into(),
                DomainState {
                    status: DomainStatus::Active,
                    ..Default::default()
                },
            );
        }
        WorkspaceManager::switch_focus(&mut ws, "c");
        assert_single_focus(&ws);
        assert_eq!(ws.active_ids(), vec!["c"]);
    }
}
