//! attune CLI: the main entry point.
//!
//! Commands:
//! - `onboard`    Initialize config, data directory, and sample personas
//! - `context`    Assemble the context blob for one message
//! - `log`        Record a finished conversational turn
//! - `import`     Load semantic memories from a JSON file
//! - `workspace`  Show a user's stored workspace
//! - `personas`   List the persona catalog
//! - `status`     Show resolved configuration
//! - `simulate`   Run a scripted multi-domain conversation

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod runtime;
mod sample;

#[derive(Parser)]
#[command(
    name = "attune",
    about = "attune: multi-domain context assembly for conversational assistants",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Use this config file instead of ~/.attune/config.toml
    #[arg(long, global = true, env = "ATTUNE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration, data directory, and sample personas
    Onboard,

    /// Assemble and print the context blob for a message
    Context {
        /// User id
        #[arg(short, long)]
        user: String,

        /// The user's message
        #[arg(short, long)]
        message: String,

        /// Also print the assembly report
        #[arg(long)]
        report: bool,
    },

    /// Record a finished turn as an episodic memory
    Log {
        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        domain: String,

        /// What the user said
        #[arg(short, long)]
        input: String,

        /// What the assistant replied
        #[arg(short, long)]
        reply: String,
    },

    /// Import semantic memories from a JSON array file
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },

    /// Print a user's stored workspace as JSON
    Workspace {
        #[arg(short, long)]
        user: String,
    },

    /// List personas and their routing keywords
    Personas,

    /// Show resolved configuration
    Status,

    /// Run a scripted conversation that switches domains
    Simulate {
        #[arg(short, long, default_value = "demo-user")]
        user: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for command output
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Onboard => commands::onboard::run(config).await?,
        Commands::Context {
            user,
            message,
            report,
        } => commands::context::run(config, &user, &message, report).await?,
        Commands::Log {
            user,
            domain,
            input,
            reply,
        } => commands::log::run(config, &user, &domain, &input, &reply).await?,
        Commands::Import { file } => commands::import::run(config, &file).await?,
        Commands::Workspace { user } => commands::workspace::run(config, &user).await?,
        Commands::Personas => commands::personas::run(config).await?,
        Commands::Status => commands::status::run(config).await?,
        Commands::Simulate { user } => commands::simulate::run(config, &user).await?,
    }

    Ok(())
}
