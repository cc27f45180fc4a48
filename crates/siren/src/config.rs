//! Config file + env loading, and resolution into a `NotifierConfig`.
//!
//! Precedence: CLI flags > `SIREN_*` env vars > config file > defaults.
//! The file lives at the platform config dir, e.g.
//! `~/.config/siren/config.toml` on Linux.

use std::path::PathBuf;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::{Deserialize, Serialize};

use siren_core::NotifierConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── File schema ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend base URL, e.g. `http://telemetry:8080`.
    #[serde(default)]
    pub backend: Option<String>,

    /// Accept self-signed TLS certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default)]
    pub timeout: Option<u64>,
}

/// Path of the config file, if a home directory can be determined.
pub fn config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "siren")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load the config file merged with `SIREN_*` env vars. A missing file
/// is fine; a malformed one is a validation error.
pub fn load_config() -> Result<Config, CliError> {
    let mut figment = Figment::new();
    if let Some(path) = config_path() {
        figment = figment.merge(Toml::file(path));
    }
    figment
        .merge(Env::prefixed("SIREN_"))
        .extract()
        .map_err(|e| CliError::Validation {
            field: "config".into(),
            reason: e.to_string(),
        })
}

// ── Resolution ───────────────────────────────────────────────────────

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Combine file/env config with CLI flag overrides into a
/// `NotifierConfig`.
pub fn resolve(global: &GlobalOpts, config: &Config) -> Result<NotifierConfig, CliError> {
    let url_str = global
        .backend
        .as_deref()
        .or(config.backend.as_deref())
        .ok_or(CliError::NoBackend)?;

    let url: url::Url = url_str.parse().map_err(|_| CliError::Validation {
        field: "backend".into(),
        reason: format!("invalid URL: {url_str}"),
    })?;

    let mut notifier_config = NotifierConfig::new(url);
    notifier_config.insecure = global.insecure || config.insecure;
    notifier_config.timeout = Duration::from_secs(
        global
            .timeout
            .or(config.timeout)
            .unwrap_or(DEFAULT_TIMEOUT_SECS),
    );

    Ok(notifier_config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::Cli;

    fn global_from(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["siren"];
        argv.extend_from_slice(args);
        argv.push("alarms");
        argv.push("stats");
        Cli::try_parse_from(argv).unwrap().global
    }

    #[test]
    fn flag_overrides_config_backend() {
        let config = Config {
            backend: Some("http://from-file:8080".into()),
            ..Config::default()
        };
        let global = global_from(&["--backend", "http://from-flag:9090"]);

        let resolved = resolve(&global, &config).unwrap();
        assert_eq!(resolved.url.as_str(), "http://from-flag:9090/");
    }

    #[test]
    fn config_backend_used_without_flag() {
        let config = Config {
            backend: Some("http://from-file:8080".into()),
            ..Config::default()
        };
        let global = global_from(&[]);

        let resolved = resolve(&global, &config).unwrap();
        assert_eq!(resolved.url.as_str(), "http://from-file:8080/");
    }

    #[test]
    fn missing_backend_is_usage_error() {
        let global = global_from(&[]);
        let err = resolve(&global, &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::NoBackend));
    }

    #[test]
    fn explicit_timeout_flag_beats_config_even_at_the_default() {
        let config = Config {
            backend: Some("http://from-file:8080".into()),
            timeout: Some(60),
            ..Config::default()
        };
        let global = global_from(&["--timeout", "30"]);

        let resolved = resolve(&global, &config).unwrap();
        assert_eq!(resolved.timeout, Duration::from_secs(30));
    }

    #[test]
    fn config_timeout_used_without_flag() {
        let config = Config {
            backend: Some("http://from-file:8080".into()),
            timeout: Some(60),
            ..Config::default()
        };
        let global = global_from(&[]);

        let resolved = resolve(&global, &config).unwrap();
        assert_eq!(resolved.timeout, Duration::from_secs(60));
    }

    #[test]
    fn invalid_url_is_rejected() {
        let global = global_from(&["--backend", "not a url"]);
        let err = resolve(&global, &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::Validation { .. }));
    }
}
