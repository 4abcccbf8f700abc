//! Translation of the config file plus global flags into a `HomeConfig`.
//!
//! Flags win over environment variables, which win over the file.

use hive_config::{Config, load_config, load_config_from};
use hive_core::HomeConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Load the file named by `--config`, or the default one.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let config = match global.config {
        Some(ref path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Apply flag overrides to a loaded config.
pub fn apply_overrides(mut config: Config, global: &GlobalOpts) -> Config {
    if let Some(ref url) = global.url {
        config.url.clone_from(url);
    }
    if let Some(ref username) = global.username {
        config.username = Some(username.clone());
    }
    if let Some(ref password) = global.password {
        config.password = Some(password.clone());
        config.password_env = None;
    }
    if let Some(timeout) = global.timeout {
        config.timeout = timeout;
    }
    if global.insecure {
        config.insecure = true;
    }
    config
}

/// Build the `HomeConfig` used to connect.
pub fn build_home_config(global: &GlobalOpts) -> Result<HomeConfig, CliError> {
    let config = apply_overrides(load(global)?, global);
    Ok(config.to_home_config()?)
}
