//! Session configuration
//!
//! Sources, in increasing precedence:
//! - hardcoded defaults
//! - `./config/osorm.{yaml,toml,json}`
//! - file named by the `OSORM_CONFIG` env var
//! - environment variables, e.g. `OSORM__HOSTS=http://a:9200,http://b:9200`

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::{CoreError, CoreResult};

fn default_hosts() -> Vec<String> {
    vec!["http://localhost:9200".to_string()]
}

/// Connection settings for a search session.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Base URLs of the cluster nodes, tried round-robin.
    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,

    /// HTTP basic auth user.
    #[serde(default)]
    pub username: Option<String>,

    /// HTTP basic auth password.
    #[serde(default)]
    pub password: Option<String>,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Scroll cursor lifetime used when the caller does not pass one
    pub scroll_lifetime_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            username: None,
            password: None,
            request_timeout_secs: 30,
            scroll_lifetime_secs: 60,
        }
    }
}

impl SessionConfig {
    /// Load configuration from defaults, files and the environment.
    pub fn load() -> CoreResult<Self> {
        let mut builder = Self::set_defaults(Config::builder())?;

        builder = builder.add_source(File::with_name("./config/osorm").required(false));

        if let Ok(config_path) = std::env::var("OSORM_CONFIG") {
            builder = builder.add_source(File::with_name(&config_path).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix("OSORM")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("hosts")
                .try_parsing(true),
        );

        let config: SessionConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        debug!(hosts = ?config.hosts, "loaded session configuration");
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let config: SessionConfig = Self::set_defaults(Config::builder())?
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn set_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("request_timeout_secs", 30)?
            .set_default("scroll_lifetime_secs", 60)
    }

    /// Validate configuration values
    pub fn validate(&self) -> CoreResult<()> {
        if self.hosts.is_empty() {
            return Err(CoreError::Config("hosts must not be empty".to_string()));
        }

        if self.request_timeout_secs == 0 {
            return Err(CoreError::Config(
                "request_timeout_secs must be > 0".to_string(),
            ));
        }

        if self.password.is_some() && self.username.is_none() {
            return Err(CoreError::Config(
                "password is set but username is missing".to_string(),
            ));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn scroll_lifetime(&self) -> Duration {
        Duration::from_secs(self.scroll_lifetime_secs)
    }
}
