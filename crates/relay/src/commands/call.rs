//! Call command - invokes one tool function and prints its response.

use anyhow::{Context as _, Result};
use clap::Args;
use console::Style;
use serde_json::Value;

use super::Context;

/// Arguments for the call command.
#[derive(Args, Debug)]
pub struct CallArgs {
    /// Function name (see `relay tools`)
    pub tool: String,

    /// Arguments as a JSON object
    #[arg(short, long, default_value = "{}")]
    pub args: String,
}

/// Run the call command.
pub async fn run(args: CallArgs, ctx: &Context) -> Result<()> {
    let arguments: Value =
        serde_json::from_str(&args.args).context("--args must be a JSON object")?;
    if !arguments.is_object() {
        anyhow::bail!("--args must be a JSON object");
    }

    let toolkit = ctx.toolkit().await?;
    let registry = ctx.registry(toolkit.clone());
    let response = registry.invoke(&args.tool, arguments).await;
    toolkit.shutdown().await;

    if ctx.json_output {
        println!("{}", serde_json::to_string(&response)?);
        return Ok(());
    }

    let style = if response["status"] == "success" {
        Style::new().green()
    } else {
        Style::new().red()
    };
    println!(
        "{} {}",
        style.apply_to(response["status"].as_str().unwrap_or("unknown")),
        args.tool
    );
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
