//! `attune workspace`: Show a user's stored workspace.

use crate::runtime::{CliResult, Runtime};
use attune_core::session::SessionStore;
use std::path::Path;

pub async fn run(config_path: Option<&Path>, user: &str) -> CliResult<()> {
    let runtime = Runtime::from_path(config_path).await?;

    match runtime.store.sessions().get_workspace(user).await? {
        Some(workspace) => println!("{}", serde_json::to_string_pretty(&workspace)?),
        None => println!("No workspace stored for '{user}'"),
    }
    Ok(())
}
