//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use amqpfw_config::ConfigError;
use amqpfw_core::{CoreError, ValidationError};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the API")]
    #[diagnostic(
        code(amqpfw::connection_failed),
        help("Check the endpoint URL and your network connection.\nTry: amqpfw --endpoint <url> ...")
    )]
    ConnectionFailed {
        #[source]
        source: amqpfw_api::Error,
    },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(amqpfw::timeout),
        help("Increase the timeout with --timeout or retry later.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(amqpfw::auth_failed),
        help(
            "Verify the API key of profile '{profile}'.\n\
             Store a new one with: amqpfw config set-key --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(amqpfw::no_credentials),
        help(
            "Configure credentials with: amqpfw config init\n\
             Or set the AMQPFW_API_KEY environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("No firewall configuration found for instance {instance_id}")]
    #[diagnostic(
        code(amqpfw::not_found),
        help("Check the instance ID, or create it with: amqpfw firewall create --file <rules>")
    )]
    NotFound { instance_id: String },

    #[error("Instance {instance_id} is not tracked locally")]
    #[diagnostic(
        code(amqpfw::not_tracked),
        help("Adopt it first with: amqpfw firewall import {instance_id}")
    )]
    NotTracked { instance_id: i64 },

    #[error("Instance {instance_id} is already tracked")]
    #[diagnostic(
        code(amqpfw::conflict),
        help("Use `amqpfw firewall update` or `amqpfw firewall apply` to change its rules.")
    )]
    AlreadyTracked { instance_id: i64 },

    // ── API ──────────────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(amqpfw::api_error))]
    Api(CoreError),

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid rules: {0}")]
    #[diagnostic(
        code(amqpfw::validation),
        help("Services must be one of AMQP, AMQPS, MQTT, MQTTS, STOMP, STOMPS; ports 0..=65554.")
    )]
    InvalidRules(ValidationError),

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(amqpfw::validation))]
    Validation { field: String, reason: String },

    #[error("Could not read rules file {path}: {reason}")]
    #[diagnostic(
        code(amqpfw::rules_file),
        help("Rules files are TOML, YAML, or JSON with `instance_id` and a `rules` array.")
    )]
    RulesFile { path: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(amqpfw::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: amqpfw config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(amqpfw::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(amqpfw::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Api(e) if e.remote().is_some_and(is_connection_error) => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::NotTracked { .. } | Self::ProfileNotFound { .. } => {
                exit_code::NOT_FOUND
            }
            Self::AlreadyTracked { .. } => exit_code::CONFLICT,
            Self::InvalidRules(_)
            | Self::Validation { .. }
            | Self::RulesFile { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the profile name to authentication failures.
    pub fn for_profile(self, profile: &str) -> Self {
        match self {
            Self::AuthFailed { message, .. } => Self::AuthFailed {
                profile: profile.into(),
                message,
            },
            other => other,
        }
    }
}

// ── amqpfw_api::Error → CliError mapping ─────────────────────────────

impl From<amqpfw_api::Error> for CliError {
    fn from(err: amqpfw_api::Error) -> Self {
        Self::from(CoreError::Api(err))
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        use amqpfw_api::Error as ApiError;

        if let CoreError::Validation(e) = err {
            return Self::InvalidRules(e);
        }

        match err.remote() {
            Some(ApiError::Authentication { message }) => {
                return Self::AuthFailed {
                    profile: "current".into(),
                    message: message.clone(),
                };
            }
            Some(ApiError::Timeout { timeout_secs }) => {
                return Self::Timeout {
                    seconds: *timeout_secs,
                };
            }
            Some(ApiError::NotFound { path }) => {
                return Self::NotFound {
                    instance_id: instance_from_path(path),
                };
            }
            _ => {}
        }

        match err {
            CoreError::Api(source) if is_connection_error(&source) => {
                Self::ConnectionFailed { source }
            }
            other => Self::Api(other),
        }
    }
}

fn is_connection_error(err: &amqpfw_api::Error) -> bool {
    matches!(
        err,
        amqpfw_api::Error::Transport(_) | amqpfw_api::Error::Tls(_)
    )
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

/// Pull the instance id out of `.../instances/{id}/...`.
fn instance_from_path(path: &str) -> String {
    path.split('/')
        .skip_while(|seg| *seg != "instances")
        .nth(1)
        .unwrap_or("?")
        .to_owned()
}
