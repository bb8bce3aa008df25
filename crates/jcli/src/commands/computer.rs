//! Computer command - agent management.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::Style;

use super::Context;

/// Arguments for the computer command.
#[derive(Args, Debug)]
pub struct ComputerArgs {
    #[command(subcommand)]
    pub command: ComputerCommand,
}

#[derive(Subcommand, Debug)]
pub enum ComputerCommand {
    /// List agents
    List,

    /// Launch an agent
    Launch {
        /// Agent name
        name: String,
    },

    /// Delete an agent
    Delete {
        /// Agent name
        name: String,
    },

    /// Print the secret an inbound agent connects with
    Secret {
        /// Agent name
        name: String,
    },

    /// Print the agent log
    Log {
        /// Agent name
        name: String,
    },

    /// Create a permanent inbound agent
    Create {
        /// Agent name
        name: String,
    },
}

/// Run the computer command.
pub async fn run(args: ComputerArgs, ctx: &Context) -> Result<()> {
    let computers = ctx.client()?.computers();

    match args.command {
        ComputerCommand::List => {
            let list = computers.list().await?;
            if ctx.json_output {
                return ctx.print_json(&list);
            }
            let green = Style::new().green();
            let red = Style::new().red();
            println!(
                "{} of {} executors busy",
                list.busy_executors, list.total_executors
            );
            for computer in &list.computer {
                let state = if computer.offline {
                    red.apply_to("offline")
                } else {
                    green.apply_to("online")
                };
                let labels: Vec<&str> = computer
                    .assigned_labels
                    .iter()
                    .map(|l| l.name.as_str())
                    .collect();
                println!(
                    "  {:<30} {:<8} {}",
                    computer.display_name,
                    state,
                    labels.join(" ")
                );
            }
        }
        ComputerCommand::Launch { name } => {
            computers.launch(&name).await?;
            println!("Launched agent '{name}'");
        }
        ComputerCommand::Delete { name } => {
            computers.delete(&name).await?;
            println!("Deleted agent '{name}'");
        }
        ComputerCommand::Secret { name } => {
            println!("{}", computers.secret(&name).await?);
        }
        ComputerCommand::Log { name } => {
            print!("{}", computers.log(&name).await?);
        }
        ComputerCommand::Create { name } => {
            computers.create(&name).await?;
            println!("Created agent '{name}'");
        }
    }
    Ok(())
}
