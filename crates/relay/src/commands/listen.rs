//! Listen command - prints server-pushed events until interrupted.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use console::Style;
use relay_client::{Event, EventCallback};

use super::Context;

/// Arguments for the listen command.
#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Stop after this many seconds (0 waits for Ctrl-C)
    #[arg(short, long, default_value_t = 0)]
    pub seconds: u64,

    /// Only print events of this type
    #[arg(short = 't', long)]
    pub event_type: Option<String>,
}

/// Run the listen command.
pub async fn run(args: ListenArgs, ctx: &Context) -> Result<()> {
    let toolkit = ctx.toolkit().await?;
    if !toolkit.has_session() {
        anyhow::bail!("no session with {}; is the server running?", ctx.server_url());
    }

    let json = ctx.json_output;
    let filter = args.event_type.clone();
    let printer: EventCallback = Arc::new(move |event: &Event| {
        if let Some(wanted) = &filter
            && event.event_type.as_deref() != Some(wanted.as_str())
        {
            return;
        }
        if json {
            println!("{}", event.raw);
        } else {
            let kind = event.event_type.as_deref().unwrap_or("event");
            println!("{} {}", Style::new().cyan().apply_to(kind), event.payload);
        }
    });
    toolkit.start_listener(Some(printer)).await;

    if !json {
        eprintln!(
            "{}",
            Style::new()
                .dim()
                .apply_to("Listening for events (Ctrl-C to stop)")
        );
    }

    if args.seconds > 0 {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(args.seconds)) => {}
            _ = tokio::signal::ctrl_c() => {}
        }
    } else {
        tokio::signal::ctrl_c().await?;
    }

    toolkit.shutdown().await;
    Ok(())
}
