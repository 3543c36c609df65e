//! Status command - connects and reports session and listener health.

use anyhow::Result;
use clap::Args;
use console::{Style, style};

use super::Context;

/// Arguments for the status command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Keep the connection open this long before reporting, so the event
    /// stream has time to come up
    #[arg(long, default_value_t = 1)]
    pub settle_secs: u64,
}

/// Run the status command.
pub async fn run(args: StatusArgs, ctx: &Context) -> Result<()> {
    let toolkit = ctx.toolkit().await?;
    if toolkit.has_session() && args.settle_secs > 0 {
        tokio::time::sleep(std::time::Duration::from_secs(args.settle_secs)).await;
    }
    let health = toolkit.health();
    toolkit.shutdown().await;

    if ctx.json_output {
        let output = serde_json::json!({
            "mcp_status": health.mcp_status(),
            "health": health,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    let status = if health.session_id.is_some() {
        Style::new().green().apply_to("● connected")
    } else {
        Style::new().red().apply_to("● disconnected")
    };

    println!();
    println!("{}", style("MCP Server Status").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();
    println!("  {} {}", dim.apply_to("Status:"), status);
    println!("  {} {}", dim.apply_to("Server:"), health.server_url);
    println!(
        "  {} {}",
        dim.apply_to("Session:"),
        health.session_id.as_deref().unwrap_or("-")
    );
    println!("  {} {}", dim.apply_to("Listener:"), health.listener.state);

    if ctx.verbose {
        println!(
            "  {} {}",
            dim.apply_to("Failures:"),
            health.listener.consecutive_failures
        );
        if let Some(at) = health.listener.last_event_at {
            println!("  {} {}", dim.apply_to("Last event:"), at.to_rfc3339());
        }
    }

    if health.session_id.is_none() {
        println!();
        println!(
            "  {}",
            dim.apply_to("Check that the MCP server is running, or pass --server")
        );
    }
    println!();

    Ok(())
}
