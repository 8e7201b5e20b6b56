//! Configuration loading and validation for the keeper server.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any variable is present but invalid.

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// `host:port` to listen on. A leading `http://` is accepted and stripped.
    #[serde(default = "default_address")]
    pub address: String,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Lifetime of a session token, in seconds.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    /// How often (seconds) the reaper sweeps expired sessions.
    #[serde(default = "default_session_reap_interval")]
    pub session_reap_interval_secs: u64,

    /// PEM certificate chain for HTTPS. Must be set together with `tls_key_path`.
    #[serde(default)]
    pub tls_cert_path: Option<String>,

    /// PEM private key for HTTPS. Must be set together with `tls_cert_path`.
    #[serde(default)]
    pub tls_key_path: Option<String>,

    /// OTLP collector endpoint; spans are only exported when set.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,
}

fn default_address() -> String {
    "localhost:8080".into()
}
fn default_log_level() -> String {
    "info".into()
}
/// Upper bound for the session TTL and the reap interval (365 days).
pub const MAX_SESSION_SECS: u64 = 365 * 24 * 60 * 60;

fn default_session_ttl() -> u64 {
    3600
}
fn default_session_reap_interval() -> u64 {
    600
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        Self::from_environment(config::Environment::default())
    }

    fn from_environment(env: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(env)
            .build()
            .context("failed to build configuration from environment")?;

        let mut c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.normalize();
        c.validate()?;
        Ok(c)
    }

    fn normalize(&mut self) {
        if let Some(rest) = self.address.strip_prefix("http://") {
            self.address = rest.to_owned();
        }
        self.address = self.address.trim_end_matches('/').to_owned();
        for path in [&mut self.tls_cert_path, &mut self.tls_key_path, &mut self.otel_exporter_otlp_endpoint] {
            if path.as_deref().is_some_and(|p| p.trim().is_empty()) {
                *path = None;
            }
        }
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.address, "ADDRESS")?;
        ensure_session_secs(self.session_ttl_secs, "SESSION_TTL_SECS")?;
        ensure_session_secs(self.session_reap_interval_secs, "SESSION_REAP_INTERVAL_SECS")?;
        if self.tls_cert_path.is_some() != self.tls_key_path.is_some() {
            anyhow::bail!("TLS_CERT_PATH and TLS_KEY_PATH must be set together");
        }
        Ok(())
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn session_reap_interval(&self) -> Duration {
        Duration::from_secs(self.session_reap_interval_secs)
    }

    /// Certificate and key paths when HTTPS is configured.
    pub fn tls_paths(&self) -> Option<(PathBuf, PathBuf)> {
        match (&self.tls_cert_path, &self.tls_key_path) {
            (Some(cert), Some(key)) => Some((PathBuf::from(cert), PathBuf::from(key))),
            _ => None,
        }
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} must not be empty");
    }
    Ok(())
}

fn ensure_session_secs(value: u64, name: &str) -> Result<()> {
    if value == 0 || value > MAX_SESSION_SECS {
        anyhow::bail!("{name} must be between 1 and {MAX_SESSION_SECS}, got {value}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let source = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Config::from_environment(config::Environment::default().source(Some(source)))
    }

    #[test]
    fn defaults_are_correct() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.address, "localhost:8080");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.session_ttl(), Duration::from_secs(3600));
        assert_eq!(cfg.session_reap_interval(), Duration::from_secs(600));
        assert!(cfg.tls_paths().is_none());
        assert!(cfg.otel_exporter_otlp_endpoint.is_none());
    }

    #[test]
    fn http_scheme_is_stripped_from_address() {
        let cfg = load(&[("ADDRESS", "http://0.0.0.0:9000/")]).unwrap();
        assert_eq!(cfg.address, "0.0.0.0:9000");
    }

    #[test]
    fn numeric_values_parse_from_strings() {
        let cfg = load(&[("SESSION_TTL_SECS", "60"), ("SESSION_REAP_INTERVAL_SECS", "5")]).unwrap();
        assert_eq!(cfg.session_ttl(), Duration::from_secs(60));
        assert_eq!(cfg.session_reap_interval(), Duration::from_secs(5));
    }

    #[test]
    fn zero_durations_are_rejected() {
        assert!(load(&[("SESSION_TTL_SECS", "0")]).is_err());
        assert!(load(&[("SESSION_REAP_INTERVAL_SECS", "0")]).is_err());
    }

    #[test]
    fn oversized_durations_are_rejected() {
        let max = u64::MAX.to_string();
        assert!(load(&[("SESSION_TTL_SECS", max.as_str())]).is_err());
        assert!(load(&[("SESSION_REAP_INTERVAL_SECS", max.as_str())]).is_err());

        let over = (MAX_SESSION_SECS + 1).to_string();
        assert!(load(&[("SESSION_TTL_SECS", over.as_str())]).is_err());

        let cfg = load(&[("SESSION_TTL_SECS", &MAX_SESSION_SECS.to_string())]).unwrap();
        assert_eq!(cfg.session_ttl(), Duration::from_secs(MAX_SESSION_SECS));
    }

    #[test]
    fn tls_paths_must_come_in_pairs() {
        assert!(load(&[("TLS_CERT_PATH", "/etc/keeper/tls.crt")]).is_err());

        let cfg = load(&[
            ("TLS_CERT_PATH", "/etc/keeper/tls.crt"),
            ("TLS_KEY_PATH", "/etc/keeper/tls.key"),
        ])
        .unwrap();
        let (cert, key) = cfg.tls_paths().unwrap();
        assert_eq!(cert, PathBuf::from("/etc/keeper/tls.crt"));
        assert_eq!(key, PathBuf::from("/etc/keeper/tls.key"));
    }

    #[test]
    fn blank_optional_values_count_as_unset() {
        let cfg = load(&[("TLS_CERT_PATH", ""), ("OTEL_EXPORTER_OTLP_ENDPOINT", " ")]).unwrap();
        assert!(cfg.tls_paths().is_none());
        assert!(cfg.otel_exporter_otlp_endpoint.is_none());
    }
}
