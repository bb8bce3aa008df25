//! Configuration for the `jcli` command line.
//!
//! A kubeconfig-style YAML file lists named automation servers and marks one
//! of them current:
//!
//! ```yaml
//! current: local
//! servers:
//!   - name: local
//!     url: http://localhost:8080
//!     username: admin
//!     token-env: JENKINS_TOKEN
//!   - name: ci
//!     url: https://ci.example.com
//!     username: bot
//!     token-file: ~/.config/jcli/ci.token
//!     crumb-policy: strict
//!     timeout: 60
//! ```
//!
//! The file lives at `~/.config/jcli/config.yaml` unless `JCLI_CONFIG`
//! points elsewhere.

pub mod config;
pub mod error;

pub use config::{
    CONFIG_ENV, JcliConfig, Server, config_path, expand_path, load_config, load_config_from,
    save_config, save_config_to,
};
pub use error::{ConfigError, Result};
