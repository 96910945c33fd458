use thiserror::Error;

/// Top-level error type for the `ipfence-api` crate.
///
/// Covers every failure mode of the identity exchange, the account
/// management endpoints, and operation polling. `ipfence-core` maps these
/// into domain diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The identity endpoint rejected the client-credentials exchange.
    #[error("Authentication failed (HTTP {status}): {body}")]
    Authentication { status: u16, body: String },

    /// The issued token cannot be sent as an `Authorization` header.
    #[error("Bearer token is not a valid HTTP header value")]
    InvalidToken,

    // ── Account API ─────────────────────────────────────────────────
    /// The account does not exist (HTTP 404 on read).
    #[error("Account not found: {id}")]
    NotFound { id: String },

    /// Any other non-200 response from the management API.
    #[error("Remote API error (HTTP {status}): {body}")]
    Remote { status: u16, body: String },

    /// A patch was accepted but carried no usable `Azure-AsyncOperation` header.
    #[error("Response carried no asynchronous operation URL")]
    MissingOperationUrl,

    /// Account resource ids are absolute ARM paths with no query or fragment.
    #[error("Invalid account id {id:?}: expected an ARM resource path starting with '/' and free of '?' or '#'")]
    InvalidAccountId { id: String },

    // ── Long-running operations ─────────────────────────────────────
    /// The operation reached a terminal status other than `Succeeded`.
    /// Carries the raw status payload for diagnosis.
    #[error("Operation failed: {raw}")]
    PollFailure { raw: String },

    /// The caller's cancellation token fired before the work finished.
    #[error("Operation cancelled")]
    Cancelled,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Aggregate ───────────────────────────────────────────────────
    /// A primary failure together with the failure to release the
    /// response that produced it. The first entry is the primary error.
    #[error("{}", join_messages(.0))]
    Multiple(Vec<Error>),
}

fn join_messages(errors: &[Error]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Merge a secondary failure into this one.
    ///
    /// Neither error is discarded: the result is `Multiple` with `self`
    /// first, flattening any nested aggregates.
    #[must_use]
    pub fn join(self, other: Error) -> Error {
        let mut errors = match self {
            Self::Multiple(errors) => errors,
            primary => vec![primary],
        };
        match other {
            Self::Multiple(more) => errors.extend(more),
            secondary => errors.push(secondary),
        }
        Self::Multiple(errors)
    }

    /// The error that determines how callers should react.
    ///
    /// For aggregates this is the first (primary) entry.
    pub fn primary(&self) -> &Error {
        match self {
            Self::Multiple(errors) => errors.first().map_or(self, Error::primary),
            other => other,
        }
    }

    /// Returns `true` if the account is gone and local state may be dropped.
    pub fn is_not_found(&self) -> bool {
        matches!(self.primary(), Self::NotFound { .. })
    }

    /// Returns `true` if the failure came from cancellation, not the remote side.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.primary(), Self::Cancelled)
    }

    /// Returns `true` if credentials were rejected.
    pub fn is_auth(&self) -> bool {
        matches!(
            self.primary(),
            Self::Authentication { .. } | Self::InvalidToken
        )
    }

    /// HTTP status attached to the primary error, if any.
    pub fn status(&self) -> Option<u16> {
        match self.primary() {
            Self::Authentication { status, .. } | Self::Remote { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
