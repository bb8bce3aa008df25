//! User command - accounts and API tokens.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::Style;

use super::Context;

/// Arguments for the user command.
#[derive(Args, Debug)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommand,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Show the current user
    Get,

    /// Create a user; a password is generated when none is given
    Create {
        /// User name
        name: String,
        /// Password
        #[arg(long)]
        password: Option<String>,
    },

    /// Generate an API token
    Token {
        /// Token name
        #[arg(long, default_value = "jcli")]
        name: String,
        /// User to generate the token for (default: current user)
        #[arg(long)]
        target: Option<String>,
    },
}

/// Run the user command.
pub async fn run(args: UserArgs, ctx: &Context) -> Result<()> {
    let users = ctx.client()?.users();
    let dim = Style::new().dim();

    match args.command {
        UserCommand::Get => {
            let user = users.get().await?;
            if ctx.json_output {
                return ctx.print_json(&user);
            }
            println!("{} ({})", user.full_name, user.id);
            if let Some(description) = user.description.filter(|d| !d.is_empty()) {
                println!("  {}", dim.apply_to(description));
            }
        }
        UserCommand::Create { name, password } => {
            let created = users.create(&name, password.as_deref()).await?;
            if ctx.json_output {
                return ctx.print_json(&created);
            }
            println!("Created user '{}'", created.username);
            if password.is_none() {
                println!("  {} {}", dim.apply_to("Password:"), created.password1);
            }
        }
        UserCommand::Token { name, target } => {
            let token = users.create_token(target.as_deref(), &name).await?;
            if ctx.json_output {
                return ctx.print_json(&token);
            }
            println!("{}", token.data.token_value);
        }
    }
    Ok(())
}
