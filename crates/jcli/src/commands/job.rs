//! Job command - trigger, inspect and stop builds.

use std::time::Duration;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use console::Style;

use jenkins_client::{BuildAndReturnOptions, ParameterDefinition};

use super::Context;

/// Delay between polls when following a log.
const FOLLOW_INTERVAL: Duration = Duration::from_secs(2);

/// Arguments for the job command.
#[derive(Args, Debug)]
pub struct JobArgs {
    #[command(subcommand)]
    pub command: JobCommand,
}

#[derive(Subcommand, Debug)]
pub enum JobCommand {
    /// Trigger a build
    Build(BuildArgs),

    /// Show a build (the last one by default)
    Get {
        /// Job name; folders separated by spaces ("folder job")
        name: String,
        /// Build number
        #[arg(short, long)]
        number: Option<u64>,
    },

    /// Print the console output of a build
    Log {
        /// Job name; folders separated by spaces ("folder job")
        name: String,
        /// Build number (default: last build)
        #[arg(short, long)]
        number: Option<u64>,
        /// Keep printing until the build finishes
        #[arg(short, long)]
        follow: bool,
    },

    /// Search jobs by name
    Search {
        /// Part of the job name
        #[arg(default_value = "")]
        name: String,
        /// Job class filter
        #[arg(long, default_value = "")]
        kind: String,
        #[arg(long, default_value_t = 0)]
        start: u32,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },

    /// Stop a build (the last one by default)
    Stop {
        /// Job name; folders separated by spaces ("folder job")
        name: String,
        /// Build number
        #[arg(short, long)]
        number: Option<u64>,
    },
}

/// Arguments for `jcli job build`.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Job name; folders separated by spaces ("folder job")
    pub name: String,

    /// String parameter as NAME=VALUE (repeatable)
    #[arg(short, long = "param", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,

    /// File parameter as NAME=PATH (repeatable)
    #[arg(long = "file", value_parser = parse_key_value)]
    pub files: Vec<(String, String)>,

    /// Wait for the build to start and print it
    #[arg(short, long)]
    pub wait: bool,

    /// Seconds to wait for the build to start (with --wait)
    #[arg(long)]
    pub timeout: Option<u32>,
}

/// Run the job command.
pub async fn run(args: JobArgs, ctx: &Context) -> Result<()> {
    let jobs = ctx.client()?.jobs();

    match args.command {
        JobCommand::Build(build) => {
            if build.wait {
                if !build.params.is_empty() || !build.files.is_empty() {
                    bail!("--wait cannot be combined with build parameters");
                }
                let options = BuildAndReturnOptions {
                    cause: Some("triggered by jcli".to_string()),
                    timeout: build.timeout,
                    delay: None,
                };
                let started = jobs.build_and_return(&build.name, &options).await?;
                if ctx.json_output {
                    return ctx.print_json(&started);
                }
                println!("Started {}", started.build.full_display_name);
                println!("  {}", started.build.url);
            } else if build.params.is_empty() && build.files.is_empty() {
                jobs.build(&build.name).await?;
                println!("Triggered '{}'", build.name);
            } else {
                let parameters = parameters(&build.params, &build.files);
                jobs.build_with_params(&build.name, &parameters).await?;
                println!(
                    "Triggered '{}' with {} parameter(s)",
                    build.name,
                    parameters.len()
                );
            }
        }
        JobCommand::Get { name, number } => {
            let build = jobs.get_build(&name, number).await?;
            if ctx.json_output {
                return ctx.print_json(&build);
            }
            let dim = Style::new().dim();
            let result = match (build.building, build.result.as_deref()) {
                (true, _) => "BUILDING",
                (false, Some(result)) => result,
                (false, None) => "UNKNOWN",
            };
            println!("{}", build.full_display_name);
            println!("  {} {}", dim.apply_to("Result:"), result);
            println!("  {} {}ms", dim.apply_to("Duration:"), build.duration);
            println!("  {} {}", dim.apply_to("URL:"), build.url);
        }
        JobCommand::Log {
            name,
            number,
            follow,
        } => {
            let mut start = 0;
            loop {
                let log = jobs.log(&name, number, start).await?;
                print!("{}", log.text);
                start = log.next_start;
                if !follow || !log.has_more {
                    break;
                }
                tokio::time::sleep(FOLLOW_INTERVAL).await;
            }
        }
        JobCommand::Search {
            name,
            kind,
            start,
            limit,
        } => {
            let items = jobs.search(&name, &kind, start, limit).await?;
            if ctx.json_output {
                return ctx.print_json(&items);
            }
            for item in items {
                println!(
                    "{:<40} {}",
                    item.full_name.as_deref().unwrap_or(&item.name),
                    item.url
                );
            }
        }
        JobCommand::Stop { name, number } => {
            jobs.stop(&name, number).await?;
            println!("Stopped '{name}'");
        }
    }
    Ok(())
}

fn parameters(params: &[(String, String)], files: &[(String, String)]) -> Vec<ParameterDefinition> {
    params
        .iter()
        .map(|(name, value)| ParameterDefinition::string(name, value))
        .chain(
            files
                .iter()
                .map(|(name, path)| ParameterDefinition::file(name, path)),
        )
        .collect()
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{s}'")),
    }
}
