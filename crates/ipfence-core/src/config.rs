// ── Runtime connection configuration ──
//
// These types describe *how* to reach Azure: credentials, endpoints and
// timing. They carry secret material but never touch disk; ipfence-config
// builds a `ReconcilerConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use ipfence_api::ClientCredentials;
use url::Url;

/// Poll intervals outside this range are clamped.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Configuration for one reconciler.
///
/// Built by the CLI or config layer and passed to `Reconciler`; core never
/// reads config files or the environment.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Service principal used for the client-credentials grant.
    pub credentials: ClientCredentials,
    /// Identity authority (e.g. `https://login.microsoftonline.com/`).
    pub authority: Url,
    /// Resource Manager endpoint (e.g. `https://management.azure.com`).
    pub management_endpoint: Url,
    /// Database account API version.
    pub api_version: String,
    /// Time between operation status checks.
    pub poll_interval: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Extra CA certificate to trust (PEM).
    pub ca_cert: Option<PathBuf>,
}

impl ReconcilerConfig {
    pub fn new(credentials: ClientCredentials) -> Self {
        Self {
            credentials,
            authority: Url::parse(ipfence_api::auth::DEFAULT_AUTHORITY)
                .expect("static authority URL"),
            management_endpoint: Url::parse(ipfence_api::account::DEFAULT_MANAGEMENT_ENDPOINT)
                .expect("static management URL"),
            api_version: ipfence_api::account::API_VERSION.into(),
            poll_interval: ipfence_api::operation::DEFAULT_POLL_INTERVAL,
            timeout: Duration::from_secs(30),
            ca_cert: None,
        }
    }

    /// The poll interval actually used.
    pub fn effective_poll_interval(&self) -> Duration {
        self.poll_interval.clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL)
    }
}
