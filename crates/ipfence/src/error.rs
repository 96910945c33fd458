//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use ipfence_config::ConfigError;
use ipfence_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach {url}: {reason}")]
    #[diagnostic(
        code(ipfence::connection_failed),
        help("Check network access to Azure, proxies, and the ca_cert setting of your profile.")
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(ipfence::auth_failed),
        help(
            "Verify the tenant id, client id and client secret of the service principal.\n\
             The principal needs permission to read and write the database account."
        )
    )]
    AuthFailed { message: String },

    #[error("No {field} configured for profile '{profile}'")]
    #[diagnostic(
        code(ipfence::no_credentials),
        help(
            "Pass it as a flag, add it to the profile in your config file,\n\
             or set the {env} environment variable."
        )
    )]
    NoCredentials {
        field: String,
        profile: String,
        env: String,
    },

    // ── Accounts ─────────────────────────────────────────────────────

    #[error("Database account '{id}' not found")]
    #[diagnostic(
        code(ipfence::not_found),
        help("Check the resource id and that the principal can see the subscription.")
    )]
    AccountNotFound { id: String },

    #[error("Public network access is not enabled on '{id}'")]
    #[diagnostic(
        code(ipfence::public_access_disabled),
        help(
            "IP rules only apply to publicly reachable accounts.\n\
             Enable public network access on the account first."
        )
    )]
    PublicAccessDisabled { id: String },

    // ── Operations ───────────────────────────────────────────────────

    #[error("IP rule update failed")]
    #[diagnostic(code(ipfence::operation_failed), help("Azure reported: {payload}"))]
    OperationFailed { payload: String },

    #[error("API error ({status}): {message}")]
    #[diagnostic(code(ipfence::api_error))]
    ApiError { status: String, message: String },

    #[error("Cancelled")]
    #[diagnostic(
        code(ipfence::cancelled),
        help(
            "A submitted update may still complete on Azure.\n\
             Run `ipfence refresh` to resync tracked state."
        )
    )]
    Cancelled,

    #[error("Request timed out")]
    #[diagnostic(
        code(ipfence::timeout),
        help("Increase the timeout with --timeout or check connectivity.")
    )]
    Timeout,

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(ipfence::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(code(ipfence::profile_not_found), help("Available profiles: {available}"))]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(ipfence::config))]
    Config(Box<figment::Error>),

    // ── State ────────────────────────────────────────────────────────

    #[error("State file {path}: {reason}")]
    #[diagnostic(
        code(ipfence::state),
        help("Fix or remove the file; `ipfence refresh` rebuilds entries for live accounts.")
    )]
    State { path: String, reason: String },

    #[error("{0}")]
    #[diagnostic(code(ipfence::internal))]
    Internal(String),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::AccountNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout | Self::Cancelled => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::ProfileNotFound { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => {
                CliError::ConnectionFailed { url, reason }
            }
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Timeout => CliError::Timeout,
            CoreError::AccountNotFound { id } => CliError::AccountNotFound { id },
            CoreError::PublicAccessDisabled { id } => CliError::PublicAccessDisabled { id },
            CoreError::OperationFailed { payload } => CliError::OperationFailed { payload },
            CoreError::Cancelled => CliError::Cancelled,
            CoreError::Api { message, status } => CliError::ApiError {
                status: status.map_or_else(|| "-".into(), |s| s.to_string()),
                message,
            },
            CoreError::Config { message } => CliError::Validation {
                field: "configuration".into(),
                reason: message,
            },
            CoreError::State { path, reason } => CliError::State { path, reason },
            CoreError::Internal(message) => CliError::Internal(message),
            CoreError::Aggregate(errors) => {
                let mut errors = errors.into_iter();
                match errors.next() {
                    Some(primary) => {
                        for secondary in errors {
                            tracing::warn!(error = %secondary, "additional failure");
                        }
                        CliError::from(primary)
                    }
                    None => CliError::Internal("unknown failure".into()),
                }
            }
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::MissingCredential {
                field,
                profile,
                env,
            } => CliError::NoCredentials {
                field: field.into(),
                profile,
                env: env.into(),
            },
            ConfigError::ProfileNotFound { name, available } => CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            },
            ConfigError::Figment(e) => CliError::Config(e),
        }
    }
}
