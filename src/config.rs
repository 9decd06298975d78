//! Configuration management for the RAX FTP client
//!
//! Timeouts and limits applied to every session. Loaded from an optional
//! `rax-ftp-client.toml` with `RAX_FTP_CLIENT_*` environment overrides.

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_FILE: &str = "rax-ftp-client";

/// Client tunables shared by the control and data channels.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Limit for establishing control and data connections.
    pub connect_timeout_secs: u64,

    /// Limit for sending a command and receiving its reply.
    pub command_timeout_secs: u64,

    /// Longest a data channel may go without reading or writing a chunk.
    pub data_timeout_secs: u64,

    /// Longest reply line accepted from the server, in bytes.
    pub max_reply_line: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            command_timeout_secs: 60,
            data_timeout_secs: 300,
            max_reply_line: 8192,
        }
    }
}

impl ClientConfig {
    /// Load configuration from `rax-ftp-client.toml` (if present) with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from the given file stem; a missing file yields defaults.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("RAX_FTP_CLIENT").try_parsing(true))
            .build()?;

        let config: ClientConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "connect_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.command_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "command_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.data_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "data_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.max_reply_line < 4 {
            return Err(ConfigError::Message(
                "max_reply_line must fit at least a reply code".into(),
            ));
        }

        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn data_timeout(&self) -> Duration {
        Duration::from_secs(self.data_timeout_secs)
    }
}
