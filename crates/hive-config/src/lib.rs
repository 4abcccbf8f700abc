//! Shared configuration for Hive tools.
//!
//! A single TOML file plus `HIVE_*` environment variables, credential
//! resolution, and translation to `hive_core::HomeConfig`. The CLI layers
//! its own flag overrides on top before translating.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hive_core::{HomeConfig, TlsMode};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {missing} configured")]
    NoCredentials { missing: &'static str },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// API base URL.
    #[serde(default = "default_url")]
    pub url: String,

    /// Account username (email address).
    pub username: Option<String>,

    /// Password (plaintext -- prefer `password_env` or `HIVE_PASSWORD`).
    pub password: Option<String>,

    /// Name of an environment variable holding the password.
    pub password_env: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Poll interval in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Path to an extra CA certificate (PEM).
    pub ca_cert: Option<PathBuf>,

    /// Accept any TLS certificate.
    #[serde(default)]
    pub insecure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: None,
            password: None,
            password_env: None,
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            poll_interval: default_poll_interval(),
            ca_cert: None,
            insecure: false,
        }
    }
}

fn default_url() -> String {
    hive_core::DEFAULT_URL.to_owned()
}
fn default_timeout() -> u64 {
    30
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_poll_interval() -> u64 {
    hive_core::DEFAULT_POLL_INTERVAL.as_secs()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "hive", "hivectl").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("hivectl");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the Config from the default file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + environment. A missing file is not an
/// error; defaults and environment still apply.
///
/// `HIVE_USERNAME` and `HIVE_PASSWORD` are left to the CLI: figment would
/// coerce an all-digit password into a number.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("HIVE_").ignore(&["username", "password"]));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Resolution ──────────────────────────────────────────────────────

impl Config {
    /// Resolve username and password.
    ///
    /// The password comes from the variable named by `password_env` when
    /// that is set, then from the plaintext `password` field.
    pub fn resolve_credentials(&self) -> Result<(String, SecretString), ConfigError> {
        let username = self
            .username
            .clone()
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::NoCredentials {
                missing: "username",
            })?;

        if let Some(ref env_name) = self.password_env {
            if let Ok(pw) = std::env::var(env_name) {
                return Ok((username, SecretString::from(pw)));
            }
        }

        match self.password {
            Some(ref pw) if !pw.is_empty() => Ok((username, SecretString::from(pw.clone()))),
            _ => Err(ConfigError::NoCredentials {
                missing: "password",
            }),
        }
    }

    /// Validate and translate into the runtime `HomeConfig`.
    pub fn to_home_config(&self) -> Result<HomeConfig, ConfigError> {
        let url: url::Url = self.url.parse().map_err(|_| ConfigError::Validation {
            field: "url".into(),
            reason: format!("invalid URL: {}", self.url),
        })?;

        if self.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        if self.poll_interval == 0 {
            return Err(ConfigError::Validation {
                field: "poll_interval".into(),
                reason: "must be at least 1 second".into(),
            });
        }

        let (username, password) = self.resolve_credentials()?;

        let tls = if self.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };

        Ok(HomeConfig {
            url,
            username,
            password,
            tls,
            timeout: Duration::from_secs(self.timeout),
            connect_timeout: Duration::from_secs(self.connect_timeout),
            poll_interval: Duration::from_secs(self.poll_interval),
        })
    }
}
