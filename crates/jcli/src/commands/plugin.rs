//! Plugin command - plugin manager and update center.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use console::Style;

use super::{Context, file_name};

/// Arguments for the plugin command.
#[derive(Args, Debug)]
pub struct PluginArgs {
    #[command(subcommand)]
    pub command: PluginCommand,
}

#[derive(Subcommand, Debug)]
pub enum PluginCommand {
    /// List installed plugins
    List {
        /// Only plugins with a pending update
        #[arg(long)]
        updates: bool,
    },

    /// Install plugins by short name
    Install {
        /// Plugin short names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Uninstall a plugin
    Uninstall {
        /// Plugin short name
        name: String,
    },

    /// Upload a plugin archive (.hpi/.jpi)
    Upload {
        /// Path to the archive
        path: PathBuf,
    },

    /// Refresh update-site metadata and list available updates
    Check,
}

/// Run the plugin command.
pub async fn run(args: PluginArgs, ctx: &Context) -> Result<()> {
    let plugins = ctx.client()?.plugins();

    match args.command {
        PluginCommand::List { updates } => {
            let mut installed = plugins.installed(1).await?.plugins;
            if updates {
                installed.retain(|p| p.has_update);
            }
            if ctx.json_output {
                return ctx.print_json(&installed);
            }
            let yellow = Style::new().yellow();
            let dim = Style::new().dim();
            for plugin in installed {
                let marker = if plugin.has_update {
                    yellow.apply_to("update available")
                } else {
                    dim.apply_to("")
                };
                println!("{:<40} {:<16} {}", plugin.short_name, plugin.version, marker);
            }
        }
        PluginCommand::Install { names } => {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            plugins.install(&names).await?;
            println!("Installing {}", names.join(", "));
        }
        PluginCommand::Uninstall { name } => {
            plugins.uninstall(&name).await?;
            println!("Uninstalled '{name}'; restart the server to finish");
        }
        PluginCommand::Upload { path } => {
            plugins.upload(&path).await?;
            println!("Uploaded {}", file_name(&path));
        }
        PluginCommand::Check => {
            plugins.check_updates().await?;
            let site = plugins.update_center().await?;
            if ctx.json_output {
                return ctx.print_json(&site.updates);
            }
            if site.updates.is_empty() {
                println!("All plugins are up to date");
            }
            for update in site.updates {
                let current = update
                    .installed
                    .as_ref()
                    .map(|i| i.version.as_str())
                    .unwrap_or("-");
                println!("{:<40} {} -> {}", update.name, current, update.version);
            }
        }
    }
    Ok(())
}
