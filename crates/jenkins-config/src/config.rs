//! Named servers, the current selection and credential resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Environment variable overriding the config file path.
pub const CONFIG_ENV: &str = "JCLI_CONFIG";

/// Directory under the platform config dir.
const APP_NAME: &str = "jcli";

/// Default config filename.
const CONFIG_FILE: &str = "config.yaml";

// ─────────────────────────────────────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root of the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JcliConfig {
    /// Name of the server used when none is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,

    /// Known servers.
    #[serde(default)]
    pub servers: Vec<Server>,
}

impl JcliConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Serialize to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// The current server, if set and present.
    pub fn current_server(&self) -> Option<&Server> {
        self.current.as_deref().and_then(|name| self.server(name))
    }

    pub fn server(&self, name: &str) -> Option<&Server> {
        self.servers.iter().find(|s| s.name == name)
    }

    /// The server called `name`, or the current one when `name` is `None`.
    pub fn select(&self, name: Option<&str>) -> Result<&Server> {
        match name {
            Some(name) => self
                .server(name)
                .ok_or_else(|| ConfigError::ServerNotFound(name.to_string())),
            None => self.current_server().ok_or(ConfigError::NoCurrentServer),
        }
    }

    /// Add a server. The first server added becomes current.
    pub fn add(&mut self, server: Server) -> Result<()> {
        if self.server(&server.name).is_some() {
            return Err(ConfigError::DuplicateServer(server.name));
        }
        if self.current.is_none() {
            self.current = Some(server.name.clone());
        }
        self.servers.push(server);
        Ok(())
    }

    /// Remove a server. Removing the current server clears the selection.
    pub fn remove(&mut self, name: &str) -> Result<Server> {
        let pos = self
            .servers
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| ConfigError::ServerNotFound(name.to_string()))?;
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        Ok(self.servers.remove(pos))
    }

    /// Make `name` the current server.
    pub fn use_server(&mut self, name: &str) -> Result<()> {
        if self.server(name).is_none() {
            return Err(ConfigError::ServerNotFound(name.to_string()));
        }
        self.current = Some(name.to_string());
        Ok(())
    }

    pub fn server_names(&self) -> Vec<&str> {
        self.servers.iter().map(|s| s.name.as_str()).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────────────────────────────────────

/// One automation server and how to authenticate against it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Server {
    pub name: String,

    /// Server URL, including any context path (`https://host/jenkins`).
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// API token stored in the file itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// File holding the API token; `~` is expanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,

    /// Environment variable holding the API token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// `permissive`, `strict` or `skip`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crumb_policy: Option<String>,

    /// Proxy URL for every request to this server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
}

impl Server {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    pub fn with_token_env(mut self, var: impl Into<String>) -> Self {
        self.token_env = Some(var.into());
        self
    }

    /// Resolve the API token: inline value, then token file, then
    /// environment variable.
    ///
    /// A configured token file that does not exist is skipped; one that
    /// exists but cannot be read is an error.
    pub fn resolve_token(&self) -> Result<Option<String>> {
        if let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) {
            return Ok(Some(token.to_string()));
        }
        if let Some(path) = &self.token_file {
            let expanded = expand_path(path);
            if expanded.exists() {
                let token = std::fs::read_to_string(&expanded).map_err(|e| {
                    ConfigError::ReadFile {
                        path: expanded.display().to_string(),
                        source: e,
                    }
                })?;
                return Ok(Some(token.trim().to_string()));
            }
            tracing::debug!(path = %expanded.display(), "token file not found");
        }
        if let Some(var) = &self.token_env {
            if let Ok(token) = std::env::var(var) {
                return Ok(Some(token));
            }
        }
        Ok(None)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Loading / Saving
// ─────────────────────────────────────────────────────────────────────────────

/// Path of the config file: `JCLI_CONFIG`, else the platform config dir.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV)
        && !path.is_empty()
    {
        return Some(expand_path(Path::new(&path)));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME).join(CONFIG_FILE))
}

/// Load the config file, or an empty config if it does not exist.
pub fn load_config() -> Result<JcliConfig> {
    load_config_from(config_path().as_deref())
}

/// Load the config from a specific path. A missing file yields an empty
/// config.
pub fn load_config_from(path: Option<&Path>) -> Result<JcliConfig> {
    let Some(path) = path else {
        return Ok(JcliConfig::new());
    };
    if !path.exists() {
        return Ok(JcliConfig::new());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    tracing::debug!(path = %path.display(), "loaded config");
    JcliConfig::from_yaml(&contents)
}

/// Save the config to the default path.
pub fn save_config(config: &JcliConfig) -> Result<()> {
    let path = config_path()
        .ok_or_else(|| ConfigError::Other("could not determine config directory".to_string()))?;
    save_config_to(config, &path)
}

/// Save the config to a specific path, creating parent directories.
pub fn save_config_to(config: &JcliConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFile {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let contents = config.to_yaml()?;
    std::fs::write(path, contents).map_err(|e| ConfigError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(())
}

/// Expand a leading `~/` to the home directory.
pub fn expand_path(path: &Path) -> PathBuf {
    if let Some(rest) = path.to_str().and_then(|s| s.strip_prefix("~/")) {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
