//! `attune context`: Assemble the context blob for one message.
//!
//! The blob goes to stdout untouched so it can be piped into a generator.
//! Ctrl-C cancels the request before anything is persisted.

use crate::runtime::{CliResult, Runtime};
use std::path::Path;
use tokio_util::sync::CancellationToken;

pub async fn run(
    config_path: Option<&Path>,
    user: &str,
    message: &str,
    report: bool,
) -> CliResult<()> {
    let runtime = Runtime::from_path(config_path).await?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let assembly = runtime.pipeline.assemble(user, message, &cancel).await?;
    println!("{}", assembly.context);

    if report {
        let r = &assembly.report;
        eprintln!();
        eprintln!("📋 Assembly Report");
        eprintln!("==================");
        eprintln!("  Domain:     {}", r.domain_id);
        eprintln!(
            "  Previous:   {}",
            r.previous_focus.as_deref().unwrap_or("(none)")
        );
        eprintln!("  New domain: {}", r.domain_created);
        eprintln!(
            "  Semantic:   {} kept of {} candidates",
            r.semantic_kept, r.semantic_candidates
        );
        eprintln!(
            "  Episodic:   {} kept of {} candidates",
            r.episodic_kept, r.episodic_candidates
        );
        eprintln!("  Task data:  {}", if r.has_task_data { "attached" } else { "none" });
        eprintln!("  Persona:    {}", if r.persona_found { "found" } else { "missing" });
        eprintln!("  Elapsed:    {} ms", r.elapsed_ms);
    }

    Ok(())
}
