//! `attune onboard`: First-time setup.

use crate::runtime::{CliResult, Store, load_config};
use crate::sample;
use attune_config::{AppConfig, StorageBackend};
use attune_core::memory::SemanticMemory;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> CliResult<()> {
    let config_dir = AppConfig::config_dir();
    let config_file = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config_dir.join("config.toml"));

    println!("🎛️  attune: First-Time Setup");
    println!("============================\n");

    // Create config file
    if let Some(parent) = config_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if config_file.exists() {
        println!("  Config already exists at: {}", config_file.display());
    } else {
        std::fs::write(&config_file, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_file.display());
    }

    let config = load_config(Some(&config_file))?;
    let data_dir = config.data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        println!("✅ Created data directory: {}", data_dir.display());
    } else {
        println!("  Data directory exists: {}", data_dir.display());
    }

    // Persona catalog
    let personas_path = config.personas_path();
    let fresh = !personas_path.exists();
    if !fresh {
        println!("  Persona catalog exists: {}", personas_path.display());
    } else {
        if let Some(parent) = personas_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&personas_path, sample::PERSONAS_JSON)?;
        println!("✅ Created sample personas: {}", personas_path.display());
    }

    // Seed memories alongside a fresh catalog, persistent backends only
    if fresh && config.storage.backend != StorageBackend::Memory {
        let store = Store::open(&config).await?;
        let memories: Vec<SemanticMemory> = serde_json::from_str(sample::MEMORIES_JSON)?;
        let count = store.import_semantic(memories).await?;
        println!("✅ Seeded {count} sample memories ({} store)", config.storage.backend);
    }

    println!("\n📝 Next steps:");
    println!("   1. Edit {} to adjust personas and keywords", personas_path.display());
    println!("   2. Run: attune context --user me --message \"check invoice 999\"");
    println!("   3. Or watch a scripted session: attune simulate\n");

    println!("🎉 Setup complete!\n");
    Ok(())
}
