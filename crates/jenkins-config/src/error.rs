//! Configuration error types.

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading, editing or resolving the config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a file.
    #[error("failed to read '{path}': {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("failed to write '{path}': {source}")]
    WriteFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse or serialize YAML.
    #[error("failed to parse YAML config: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    /// No server with this name.
    #[error("server '{0}' not found")]
    ServerNotFound(String),

    /// A server with this name already exists.
    #[error("server '{0}' already exists")]
    DuplicateServer(String),

    /// No server selected and none given explicitly.
    #[error("no current server; add one with `jcli config add` or pass --url")]
    NoCurrentServer,

    /// Other error.
    #[error("{0}")]
    Other(String),
}
