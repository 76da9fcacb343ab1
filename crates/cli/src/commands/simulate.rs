//! `attune simulate`: A scripted conversation across two domains.
//!
//! The user opens a fiscal question, switches to product registration, and
//! comes back to the invoice. Each turn prints the assembled context and
//! logs a canned assistant reply, so later turns show recalled history.

use crate::runtime::{CliResult, Runtime};
use attune_core::memory::EpisodicMemory;
use std::path::Path;
use tokio_util::sync::CancellationToken;

const SCRIPT: &[(&str, &str)] = &[
    (
        "What is the latest status of the analysis of my nfe 78910?",
        "Understood. To analyse NF-e 78910, please attach the file or send me its access key.",
    ),
    (
        "Ok, thanks. Now I need to register a new product.",
        "Sure. To start, tell me the full description and the brand of the new product.",
    ),
    (
        "Back to the nfe 78910: here is the access key.",
        "Thanks, I am checking NF-e 78910 against the authorization records now.",
    ),
];

pub async fn run(config_path: Option<&Path>, user: &str) -> CliResult<()> {
    let runtime = Runtime::from_path(config_path).await?;

    for (turn, (input, reply)) in SCRIPT.iter().enumerate() {
        println!("{}", "=".repeat(72));
        println!(">>> Turn {}: {input}", turn + 1);
        println!("{}", "=".repeat(72));

        let assembly = runtime
            .pipeline
            .assemble(user, input, &CancellationToken::new())
            .await?;
        let report = &assembly.report;
        match report.previous_focus.as_deref() {
            Some(previous) if previous != report.domain_id => {
                println!("🔀 Focus: {previous} → {}", report.domain_id)
            }
            _ => println!("🎯 Focus: {}", report.domain_id),
        }

        println!("\n--- Context ---");
        println!("{}", assembly.context);
        println!("\n--- Simulated reply ---");
        println!("{reply}\n");

        runtime
            .pipeline
            .record_interaction(EpisodicMemory::now(user, &report.domain_id, *input, *reply))
            .await?;
    }

    println!("🎉 Simulation complete. Inspect it with: attune workspace --user {user}");
    Ok(())
}
