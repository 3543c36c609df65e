//! Tools command - lists the callable functions.

use anyhow::Result;
use clap::Args;
use console::style;

use super::Context;

/// Arguments for the tools command.
#[derive(Args, Debug)]
pub struct ToolsArgs {}

/// Run the tools command.
pub async fn run(_args: ToolsArgs, ctx: &Context) -> Result<()> {
    let registry = ctx.registry(std::sync::Arc::new(ctx.offline_toolkit()?));
    let names = registry.names();

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(names)?);
        return Ok(());
    }

    println!();
    println!("{}", style("Available tools").bold());
    println!();
    for name in names {
        println!("  {}", name);
    }
    println!();

    Ok(())
}
