//! CLI command handlers.

pub mod casc;
pub mod computer;
pub mod config;
pub mod job;
pub mod plugin;
pub mod queue;
pub mod status;
pub mod user;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use serde::Serialize;

use jenkins_client::{CrumbPolicy, JenkinsClient, JenkinsCore, ReqwestTransport};
use jenkins_config::JcliConfig;

/// User agent sent by every request.
const USER_AGENT: &str = concat!("jcli/", env!("CARGO_PKG_VERSION"));

/// Shared context for all commands.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Explicit config file.
    pub config_path: Option<PathBuf>,
    /// Named server to use instead of the current one.
    pub server: Option<String>,
    /// Server URL, bypassing the config file.
    pub url: Option<String>,
    pub user: Option<String>,
    pub token: Option<String>,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

/// Everything needed to reach one server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Connection {
    pub url: String,
    pub user: Option<String>,
    pub token: Option<String>,
    pub timeout: Option<u64>,
    pub crumb_policy: CrumbPolicy,
    pub proxy: Option<String>,
}

impl Context {
    /// Path of the config file in effect.
    pub fn config_file(&self) -> Result<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(jenkins_config::expand_path(path)),
            None => jenkins_config::config_path().context("could not determine config directory"),
        }
    }

    pub fn load_config(&self) -> Result<JcliConfig> {
        let path = self.config_file()?;
        jenkins_config::load_config_from(Some(&path))
            .with_context(|| format!("loading {}", path.display()))
    }

    /// Work out the connection from the flags and the config file.
    ///
    /// `--url` bypasses the config file. Otherwise the named or current
    /// server is used and `--user`/`--token` override what it stores.
    pub fn connection(&self, config: &JcliConfig) -> Result<Connection> {
        if let Some(url) = &self.url {
            return Ok(Connection {
                url: url.clone(),
                user: self.user.clone(),
                token: self.token.clone(),
                ..Default::default()
            });
        }

        let server = config.select(self.server.as_deref())?;
        let token = match &self.token {
            Some(token) => Some(token.clone()),
            None => server
                .resolve_token()
                .with_context(|| format!("resolving token for server '{}'", server.name))?,
        };
        let crumb_policy = match &server.crumb_policy {
            Some(policy) => policy
                .parse::<CrumbPolicy>()
                .with_context(|| format!("server '{}'", server.name))?,
            None => CrumbPolicy::default(),
        };
        Ok(Connection {
            url: server.url.clone(),
            user: self.user.clone().or_else(|| server.username.clone()),
            token,
            timeout: server.timeout,
            crumb_policy,
            proxy: server.proxy.clone(),
        })
    }

    /// Build a client for the selected server.
    pub fn client(&self) -> Result<JenkinsClient> {
        let config = match &self.url {
            Some(_) => JcliConfig::new(),
            None => self.load_config()?,
        };
        let connection = self.connection(&config)?;
        tracing::debug!(url = %connection.url, user = ?connection.user, "connecting");
        build_client(&connection)
    }

    /// Print `value` as pretty JSON.
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

fn build_client(connection: &Connection) -> Result<JenkinsClient> {
    let timeout = connection.timeout.map(Duration::from_secs);
    let mut builder = JenkinsCore::builder()
        .base_url(&connection.url)
        .crumb_policy(connection.crumb_policy)
        .user_agent(USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(Some(timeout));
    }
    match (&connection.user, &connection.token) {
        (Some(user), Some(token)) => builder = builder.basic_auth(user, token),
        (Some(user), None) => builder = builder.user_name(user),
        _ => {}
    }
    if let Some(proxy) = &connection.proxy {
        let mut http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .proxy(reqwest::Proxy::all(proxy).with_context(|| format!("invalid proxy '{proxy}'"))?);
        if let Some(timeout) = timeout {
            http = http.timeout(timeout);
        }
        builder = builder.transport(Arc::new(ReqwestTransport::new(http.build()?)));
    }
    Ok(JenkinsClient::new(builder.build()?))
}

/// Print a section header in the human-readable output.
pub fn print_header(title: &str) {
    let dim = console::Style::new().dim();
    println!();
    println!("{}", console::style(title).bold());
    println!("{}", dim.apply_to("─".repeat(40)));
}

/// Final path component, for messages about local files.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
