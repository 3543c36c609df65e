//! Reconnect command - checks whether a session id is still valid.

use anyhow::Result;
use clap::Args;
use console::Style;

use super::Context;

/// Arguments for the reconnect command.
#[derive(Args, Debug)]
pub struct ReconnectArgs {
    /// Session id to validate and adopt
    pub session_id: String,
}

/// Run the reconnect command.
pub async fn run(args: ReconnectArgs, ctx: &Context) -> Result<()> {
    let toolkit = ctx.offline_toolkit()?;
    let valid = toolkit.reconnect_session(&args.session_id).await;
    toolkit.shutdown().await;

    if ctx.json_output {
        let output = serde_json::json!({
            "session_id": args.session_id,
            "valid": valid,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if valid {
        println!(
            "{} session {} is active",
            Style::new().green().apply_to("●"),
            args.session_id
        );
    } else {
        println!(
            "{} session {} is not known to {}",
            Style::new().red().apply_to("●"),
            args.session_id,
            ctx.server_url()
        );
    }

    Ok(())
}
