//! `attune import`: Load semantic memories from a JSON array file.
//!
//! Memories without an embedding are embedded on the way in when an
//! embedding provider is configured.

use crate::runtime::{CliResult, Runtime};
use attune_core::embedding::Embedder;
use attune_core::memory::SemanticMemory;
use std::path::Path;

pub async fn run(config_path: Option<&Path>, file: &Path) -> CliResult<()> {
    let runtime = Runtime::from_path(config_path).await?;

    let content = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;
    let mut memories: Vec<SemanticMemory> = serde_json::from_str(&content)
        .map_err(|e| format!("Invalid memory file {}: {e}", file.display()))?;

    let mut embedded = 0;
    if let Some(embedder) = &runtime.embedder {
        for memory in memories.iter_mut().filter(|m| m.embedding.is_none()) {
            memory.embedding = Some(embedder.embed(&memory.text).await?);
            embedded += 1;
        }
    }

    let count = runtime.store.import_semantic(memories).await?;
    println!(
        "📥 Imported {count} memories into the {} store",
        runtime.config.storage.backend
    );
    if embedded > 0 {
        println!("   {embedded} embedded with {} dimensions", runtime.config.embedding.dimensions);
    }
    Ok(())
}
