//! jcli - command line client for Jenkins servers.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{casc, computer, config, job, plugin, queue, status, user};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// jcli - command line client for Jenkins servers
#[derive(Parser)]
#[command(name = "jcli")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: ~/.config/jcli/config.yaml)
    #[arg(long, global = true, env = "JCLI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Named server from the config file (default: the current one)
    #[arg(short, long, global = true)]
    pub server: Option<String>,

    /// Server URL, bypassing the config file
    #[arg(long, global = true, env = "JENKINS_URL")]
    pub url: Option<String>,

    /// User name
    #[arg(long, global = true, env = "JENKINS_USER")]
    pub user: Option<String>,

    /// API token
    #[arg(long, global = true, env = "JENKINS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show server status
    Status(status::StatusArgs),

    /// Build queue
    Queue(queue::QueueArgs),

    /// Agent management
    Computer(computer::ComputerArgs),

    /// Job operations
    Job(job::JobArgs),

    /// Plugin management
    Plugin(plugin::PluginArgs),

    /// Configuration as code
    Casc(casc::CascArgs),

    /// User management
    User(user::UserArgs),

    /// Manage configured servers
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_json);

    let ctx = commands::Context {
        config_path: cli.config,
        server: cli.server,
        url: cli.url,
        user: cli.user,
        token: cli.token,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Status(args) => status::run(args, &ctx).await,
        Commands::Queue(args) => queue::run(args, &ctx).await,
        Commands::Computer(args) => computer::run(args, &ctx).await,
        Commands::Job(args) => job::run(args, &ctx).await,
        Commands::Plugin(args) => plugin::run(args, &ctx).await,
        Commands::Casc(args) => casc::run(args, &ctx).await,
        Commands::User(args) => user::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}

/// Logs go to stderr so command output stays pipeable. `RUST_LOG` wins over
/// `--verbose`.
fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose {
        "jcli=debug,jenkins_client=debug,jenkins_config=debug,info"
    } else {
        "jcli=info,jenkins_client=warn,jenkins_config=warn,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
