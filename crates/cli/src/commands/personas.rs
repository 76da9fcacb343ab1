//! `attune personas`: List the persona catalog.

use crate::runtime::{CliResult, load_catalog, load_config};
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let catalog = load_catalog(&config)?;

    println!("🎭 Personas ({})", config.personas_path().display());
    println!("========");
    for entry in catalog.entries() {
        let persona = &entry.persona;
        let marker = if persona.id == catalog.default_domain() {
            " (default)"
        } else {
            ""
        };
        println!("  {} ({}){marker}", persona.id, persona.display_name);
        if !persona.semantic_description.is_empty() {
            println!("      {}", persona.semantic_description);
        }
        if !entry.keywords.is_empty() {
            println!("      keywords: {}", entry.keywords.join(", "));
        }
    }
    if catalog.find(catalog.default_domain()).is_none() {
        println!(
            "\n  ⚠️  Default domain '{}' has no persona; unmatched input will render an error line",
            catalog.default_domain()
        );
    }
    Ok(())
}
