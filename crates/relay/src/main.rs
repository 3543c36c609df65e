//! Relay - bridge between conversational agents and MCP execution servers
//!
//! Main entry point for the relay CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{call, config, listen, reconnect, status, tools};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Relay - bridge between conversational agents and MCP execution servers
#[derive(Parser)]
#[command(name = "relay")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// MCP server URL (default: http://localhost:8080)
    #[arg(long, global = true, env = "MCP_SERVER_URL")]
    pub server: Option<String>,

    /// Directory holding config.toml (default: platform config dir)
    #[arg(long, global = true, env = "RELAY_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show session and event listener status
    Status(status::StatusArgs),

    /// Call a tool function by name
    Call(call::CallArgs),

    /// List the available tool functions
    Tools(tools::ToolsArgs),

    /// Print events from the server's event stream
    Listen(listen::ListenArgs),

    /// Check and adopt an existing session
    Reconnect(reconnect::ReconnectArgs),

    /// Show the effective configuration
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Console (human-readable, stderr) + rotating JSON file
    let filter = if cli.verbose {
        "relay=debug,relay_client=debug,relay_tools=debug,relay_config=debug,info"
    } else {
        "relay=info,relay_client=info,relay_tools=info,warn"
    };

    let log_dir = relay_config::user_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "relay.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "relay=trace,relay_client=trace,relay_tools=trace,relay_config=trace,info",
                )),
        )
        .init();

    let loaded = relay_config::load_config_with_options(None, cli.config_dir.as_deref())?;
    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
    }

    let mut config = loaded.config.clone();
    if let Some(server) = cli.server.as_deref().filter(|s| !s.trim().is_empty()) {
        config.set_server_url(server.trim());
    }

    let ctx = commands::Context {
        config,
        loaded,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Status(args) => status::run(args, &ctx).await,
        Commands::Call(args) => call::run(args, &ctx).await,
        Commands::Tools(args) => tools::run(args, &ctx).await,
        Commands::Listen(args) => listen::run(args, &ctx).await,
        Commands::Reconnect(args) => reconnect::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
