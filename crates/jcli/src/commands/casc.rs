//! Casc command - configuration as code.

use anyhow::Result;
use clap::{Args, Subcommand};

use super::Context;

/// Arguments for the casc command.
#[derive(Args, Debug)]
pub struct CascArgs {
    #[command(subcommand)]
    pub command: CascCommand,
}

#[derive(Subcommand, Debug)]
pub enum CascCommand {
    /// Reload the configuration from its source
    Reload,

    /// Apply the configuration
    Apply,

    /// Print the running configuration as YAML
    Export,

    /// Print the configuration JSON schema
    Schema,
}

/// Run the casc command.
pub async fn run(args: CascArgs, ctx: &Context) -> Result<()> {
    let casc = ctx.client()?.casc();

    match args.command {
        CascCommand::Reload => {
            casc.reload().await?;
            println!("Configuration reloaded");
        }
        CascCommand::Apply => {
            casc.apply().await?;
            println!("Configuration applied");
        }
        CascCommand::Export => print!("{}", casc.export().await?),
        CascCommand::Schema => print!("{}", casc.schema().await?),
    }
    Ok(())
}
