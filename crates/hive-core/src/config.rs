// ── Runtime connection configuration ──
//
// Describes how to reach the Hive API and as whom. Carries credentials and
// transport tuning but never touches disk: the CLI (via hive-config) builds
// a `HomeConfig` and hands it to `Home::connect`.

use std::time::Duration;

use hive_api::{DEFAULT_URL, TlsMode, TransportConfig};
use secrecy::SecretString;
use url::Url;

/// How often device views are refreshed when polling.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for a single Hive account.
#[derive(Debug, Clone)]
pub struct HomeConfig {
    /// API base URL (e.g., `https://api-prod.bgchprod.info`).
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    /// TLS verification strategy.
    pub tls: TlsMode,
    /// Whole-request timeout.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Period of the background poller.
    pub poll_interval: Duration,
}

impl HomeConfig {
    /// A config for the live API with default transport settings.
    pub fn new(username: impl Into<String>, password: SecretString) -> Result<Self, url::ParseError> {
        let transport = TransportConfig::default();
        Ok(Self {
            url: Url::parse(DEFAULT_URL)?,
            username: username.into(),
            password,
            tls: transport.tls,
            timeout: transport.timeout,
            connect_timeout: transport.connect_timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = url;
        self
    }

    /// Transport settings derived from this config.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            ..TransportConfig::default()
        }
    }
}
