//! Status command - shows server status.

use anyhow::Result;
use clap::Args;
use console::Style;

use super::{Context, print_header};

/// Arguments for the status command.
#[derive(Args, Debug)]
pub struct StatusArgs {}

/// Run the status command.
pub async fn run(_args: StatusArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let status = client.status().get().await?;

    if ctx.json_output {
        return ctx.print_json(&status);
    }

    let dim = Style::new().dim();
    print_header("Jenkins Server Status");
    println!();
    println!("  {} {}", dim.apply_to("Server:"), client.core().base_url());
    println!("  {} {}", dim.apply_to("Version:"), status.version);
    println!("  {} {}", dim.apply_to("Node:"), status.node_name);
    println!("  {} {}", dim.apply_to("Executors:"), status.num_executors);
    println!("  {} {}", dim.apply_to("Security:"), status.use_security);
    if ctx.verbose {
        if let Some(user) = client.core().user_name() {
            println!("  {} {}", dim.apply_to("User:"), user);
        }
        println!("  {} {}", dim.apply_to("Crumbs:"), client.core().crumb_policy());
    }
    println!();
    Ok(())
}
