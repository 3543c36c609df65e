//! Config command - shows the effective configuration and where it came from.

use anyhow::Result;
use clap::Args;
use console::{Style, style};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Also list files that were checked but not found
    #[arg(short, long)]
    pub all: bool,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    let sources: Vec<_> = ctx
        .loaded
        .sources
        .iter()
        .filter(|s| args.all || s.loaded)
        .collect();

    if ctx.json_output {
        let output = serde_json::json!({
            "config": serde_json::to_value(&ctx.config)?,
            "sources": sources
                .iter()
                .map(|s| serde_json::json!({ "path": s.path, "loaded": s.loaded }))
                .collect::<Vec<_>>(),
            "env_override": ctx.loaded.env_override,
            "warnings": ctx.loaded.warnings,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!();
    println!("{}", style("Configuration").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    for source in &sources {
        let marker = if source.loaded { "loaded" } else { "not found" };
        println!("  {} ({})", source.path.display(), dim.apply_to(marker));
    }
    if sources.is_empty() {
        println!("  {}", dim.apply_to("no config files, using defaults"));
    }
    if ctx.loaded.env_override {
        println!("  {}", dim.apply_to("server url from MCP_SERVER_URL"));
    }
    for warning in &ctx.loaded.warnings {
        println!("  {} {}", Style::new().yellow().apply_to("warning:"), warning);
    }
    println!();

    let mut effective = ctx.config.clone();
    // Show every section, including defaults.
    effective.server = Some(effective.server());
    effective.listener = Some(effective.listener());
    effective.startup = Some(effective.startup());
    effective.tools = Some(effective.tools());
    println!("{}", effective.to_toml()?);

    Ok(())
}
