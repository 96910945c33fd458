// ── Core error types ──
//
// Domain errors from ipfence-core. Consumers never see raw transport
// failures; the `From<ipfence_api::Error>` impl translates them into
// variants that say what went wrong with the account or the operation.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out")]
    Timeout,

    // ── Account errors ───────────────────────────────────────────────
    #[error("Account not found: {id}")]
    AccountNotFound { id: String },

    #[error(
        "Account {id} is not publicly accessible; enable public network access to manage IP rules"
    )]
    PublicAccessDisabled { id: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("IP rule update failed: {payload}")]
    OperationFailed { payload: String },

    #[error("Cancelled before completion")]
    Cancelled,

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── State errors ─────────────────────────────────────────────────
    #[error("State file {path}: {reason}")]
    State { path: String, reason: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),

    /// Several failures surfaced together; the first is the primary one.
    #[error("{}", join_messages(.0))]
    Aggregate(Vec<CoreError>),
}

fn join_messages(errors: &[CoreError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl CoreError {
    /// The error that decides how a caller should react.
    pub fn primary(&self) -> &CoreError {
        match self {
            Self::Aggregate(errors) => errors.first().map_or(self, CoreError::primary),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.primary(), Self::AccountNotFound { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.primary(), Self::Cancelled)
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<ipfence_api::Error> for CoreError {
    fn from(err: ipfence_api::Error) -> Self {
        match err {
            ipfence_api::Error::Authentication { status, body } => CoreError::AuthenticationFailed {
                message: format!("identity endpoint returned HTTP {status}: {body}"),
            },
            ipfence_api::Error::InvalidToken => CoreError::AuthenticationFailed {
                message: "identity endpoint issued a token that cannot be sent".into(),
            },
            ipfence_api::Error::NotFound { id } => CoreError::AccountNotFound { id },
            ipfence_api::Error::Remote { status, body } => CoreError::Api {
                message: body,
                status: Some(status),
            },
            ipfence_api::Error::MissingOperationUrl => CoreError::Api {
                message: "update accepted without an Azure-AsyncOperation header".into(),
                status: None,
            },
            ipfence_api::Error::InvalidAccountId { id } => CoreError::Config {
                message: format!(
                    "invalid account id {id:?}: expected a resource path starting with '/' and free of '?' or '#'"
                ),
            },
            ipfence_api::Error::PollFailure { raw } => CoreError::OperationFailed { payload: raw },
            ipfence_api::Error::Cancelled => CoreError::Cancelled,
            ipfence_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ipfence_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ipfence_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ipfence_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            ipfence_api::Error::Multiple(errors) => {
                CoreError::Aggregate(errors.into_iter().map(CoreError::from).collect())
            }
        }
    }
}
