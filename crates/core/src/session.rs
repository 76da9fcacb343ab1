//! Session store: persistence of whole cognitive workspaces.

use async_trait::async_trait;

use crate::error::SessionError;
use crate::workspace::CognitiveWorkspace;

/// The session collaborator. One record per user, overwritten in full.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a user's workspace. Absence is `Ok(None)`, not an error.
    async fn get_workspace(&self, user_id: &str) -> Result<Option<CognitiveWorkspace>, SessionError>;

    /// Replace the stored workspace for `workspace.user_id`.
    async fn save_workspace(&self, workspace: &CognitiveWorkspace) -> Result<(), SessionError>;
}
