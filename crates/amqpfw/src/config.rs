//! CLI configuration: thin wrapper around `amqpfw_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--endpoint, --api-key, --timeout, --retries, --state-dir).

use std::path::PathBuf;

use amqpfw_config::Connection;
use secrecy::SecretString;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use amqpfw_config::{Config, Profile, config_path, load_config_or_default, save_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// State directory: flag > env > platform data dir.
pub fn state_dir(global: &GlobalOpts) -> PathBuf {
    global
        .state_dir
        .clone()
        .unwrap_or_else(amqpfw_config::state::state_dir)
}

/// Build a `Connection` from the config file, active profile, and flags.
///
/// Works without a config file when `--api-key` (or `AMQPFW_API_KEY`)
/// is given; the endpoint then defaults to the public API.
pub fn resolve_connection(global: &GlobalOpts) -> Result<Connection, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.api_key.is_some() => Profile::default(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        None => {
            return Err(CliError::NoCredentials {
                profile: profile_name,
            });
        }
    };

    // Flags override the profile
    if let Some(ref endpoint) = global.endpoint {
        profile.endpoint.clone_from(endpoint);
    }
    profile.timeout = global.timeout.or(profile.timeout);
    profile.max_retries = global.retries.or(profile.max_retries);

    let api_key = match global.api_key {
        Some(ref key) => SecretString::from(key.clone()),
        None => amqpfw_config::resolve_api_key(&profile, &profile_name)?,
    };

    let conn = amqpfw_config::build_connection(&profile, &cfg.defaults, api_key)?;
    tracing::debug!(
        profile = %profile_name,
        endpoint = %conn.endpoint,
        timeout = ?conn.transport.timeout,
        retries = conn.retry.max_retries,
        "resolved connection"
    );
    Ok(conn)
}

/// Comma-separated profile names for help text.
pub fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}
