//! `attune status`: Show resolved configuration.

use crate::runtime::{CliResult, load_config};
use attune_config::AppConfig;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;

    println!("🎛️  attune Status");
    println!("================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Data dir:     {}", config.data_dir().display());
    println!("  Storage:      {}", config.storage.backend);
    println!("  Personas:     {}", config.personas_path().display());
    println!(
        "  Knowledge:    {}",
        config
            .storage
            .knowledge_dir
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "(disabled)".into())
    );
    println!(
        "  Ranking:      semantic={}, episodic={}",
        config.attention.semantic, config.attention.episodic
    );
    println!(
        "  Candidates:   semantic={}, episodic={}",
        config.pipeline.semantic_candidates, config.pipeline.episodic_candidates
    );
    println!("  Timeout:      {} ms", config.pipeline.collaborator_timeout_ms);
    println!("  Default:      {}", config.pipeline.default_domain);
    println!(
        "  Embeddings:   {:?} ({} dims)",
        config.embedding.provider, config.embedding.dimensions
    );

    // Check file existence
    let config_file = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    if config_file.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file, run `attune onboard` first");
    }
    if !config.personas_path().exists() {
        println!("  ⚠️  No persona catalog, run `attune onboard` first");
    }

    Ok(())
}
