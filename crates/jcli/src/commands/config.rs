//! Config command - manage configured servers.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use console::Style;
use serde::Serialize;

use jenkins_config::Server;

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// List configured servers
    List,

    /// Add a server
    Add {
        /// Server name
        name: String,

        /// Server URL (e.g., http://localhost:8080)
        #[arg(long)]
        url: String,

        /// User name
        #[arg(long)]
        username: Option<String>,

        /// API token, stored in the config file
        #[arg(long)]
        token: Option<String>,

        /// File holding the API token
        #[arg(long)]
        token_file: Option<PathBuf>,

        /// Environment variable holding the API token
        #[arg(long)]
        token_env: Option<String>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Crumb policy: permissive, strict or skip
        #[arg(long)]
        crumb_policy: Option<String>,

        /// Proxy URL
        #[arg(long)]
        proxy: Option<String>,
    },

    /// Remove a server
    Remove {
        /// Server name
        name: String,
    },

    /// Make a server the current one
    Use {
        /// Server name
        name: String,
    },
}

/// Server entry for JSON output. Tokens are never printed.
#[derive(Debug, Serialize)]
struct ServerOutput<'a> {
    name: &'a str,
    url: &'a str,
    username: Option<&'a str>,
    current: bool,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    let path = ctx.config_file()?;
    let mut config = ctx.load_config()?;

    match args.command {
        ConfigCommand::List => {
            let current = config.current.as_deref();
            let servers: Vec<ServerOutput<'_>> = config
                .servers
                .iter()
                .map(|s| ServerOutput {
                    name: &s.name,
                    url: &s.url,
                    username: s.username.as_deref(),
                    current: current == Some(s.name.as_str()),
                })
                .collect();
            if ctx.json_output {
                return ctx.print_json(&servers);
            }
            if servers.is_empty() {
                println!("No servers configured");
                println!("  Add one with: jcli config add <name> --url <url>");
                return Ok(());
            }
            let green = Style::new().green();
            for server in servers {
                let marker = if server.current { "*" } else { " " };
                println!(
                    "{} {:<20} {}",
                    green.apply_to(marker),
                    server.name,
                    server.url
                );
            }
            return Ok(());
        }
        ConfigCommand::Add {
            name,
            url,
            username,
            token,
            token_file,
            token_env,
            timeout,
            crumb_policy,
            proxy,
        } => {
            if let Some(policy) = &crumb_policy {
                policy.parse::<jenkins_client::CrumbPolicy>()?;
            }
            config.add(Server {
                name: name.clone(),
                url,
                username,
                token,
                token_file,
                token_env,
                timeout,
                crumb_policy,
                proxy,
            })?;
            println!("Added server '{name}'");
        }
        ConfigCommand::Remove { name } => {
            config.remove(&name)?;
            println!("Removed server '{name}'");
        }
        ConfigCommand::Use { name } => {
            config.use_server(&name)?;
            println!("Switched to server '{name}'");
        }
    }

    jenkins_config::save_config_to(&config, &path)
        .with_context(|| format!("saving {}", path.display()))?;
    tracing::debug!(path = %path.display(), "config saved");
    Ok(())
}
