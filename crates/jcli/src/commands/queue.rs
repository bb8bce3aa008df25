//! Queue command - inspect and cancel queued builds.

use anyhow::Result;
use clap::{Args, Subcommand};

use super::Context;

/// Arguments for the queue command.
#[derive(Args, Debug)]
pub struct QueueArgs {
    #[command(subcommand)]
    pub command: Option<QueueCommand>,
}

#[derive(Subcommand, Debug)]
pub enum QueueCommand {
    /// List queued items (default)
    List,

    /// Cancel a queued item
    Cancel {
        /// Queue item ID
        id: i64,
    },
}

/// Run the queue command.
pub async fn run(args: QueueArgs, ctx: &Context) -> Result<()> {
    let queue = ctx.client()?.queue();

    match args.command.unwrap_or(QueueCommand::List) {
        QueueCommand::List => {
            let items = queue.get().await?.items;
            if ctx.json_output {
                return ctx.print_json(&items);
            }
            if items.is_empty() {
                println!("Queue is empty");
            }
            for item in items {
                println!(
                    "{:<8} {:<50} {}",
                    item.id,
                    item.url,
                    item.why.as_deref().unwrap_or("")
                );
            }
        }
        QueueCommand::Cancel { id } => {
            queue.cancel(id).await?;
            println!("Cancelled queue item {id}");
        }
    }
    Ok(())
}
