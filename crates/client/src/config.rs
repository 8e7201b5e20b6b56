//! Client configuration from environment variables.
//!
//! Command-line flags take precedence; see `main.rs`.

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the keeper server.
    #[serde(default = "default_address")]
    pub address: String,

    /// Directory holding `{login}-cert.pem` key files.
    #[serde(default = "default_key_path")]
    pub key_path: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_address() -> String {
    "http://localhost:8080".into()
}
fn default_key_path() -> String {
    "keys".into()
}
fn default_log_level() -> String {
    "warn".into()
}

impl Config {
    /// Load configuration from `ADDRESS`, `KEY_PATH`, and `LOG_LEVEL`.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be deserialised.
    pub fn from_env() -> Result<Self> {
        Self::from_environment(config::Environment::default())
    }

    fn from_environment(env: config::Environment) -> Result<Self> {
        let c: Config = config::Config::builder()
            .add_source(env)
            .build()
            .context("failed to build configuration from environment")?
            .try_deserialize()
            .context("failed to deserialise configuration")?;
        Ok(c.normalized())
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(mut self, address: Option<String>, key_path: Option<String>) -> Self {
        if let Some(address) = address {
            self.address = address;
        }
        if let Some(key_path) = key_path {
            self.key_path = key_path;
        }
        self.normalized()
    }

    /// A bare `host:port` gets an `http://` scheme.
    fn normalized(mut self) -> Self {
        if !self.address.contains("://") {
            self.address = format!("http://{}", self.address);
        }
        self
    }
}
