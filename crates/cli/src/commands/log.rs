//! `attune log`: Record a finished conversational turn.

use crate::runtime::{CliResult, Runtime};
use attune_core::memory::EpisodicMemory;
use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    user: &str,
    domain: &str,
    input: &str,
    reply: &str,
) -> CliResult<()> {
    let runtime = Runtime::from_path(config_path).await?;
    runtime
        .pipeline
        .record_interaction(EpisodicMemory::now(user, domain, input, reply))
        .await?;

    println!("✅ Recorded turn for {user} in '{domain}'");
    Ok(())
}
