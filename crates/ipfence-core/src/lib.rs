// ipfence-core: Reconciliation engine and lifecycle orchestration between ipfence-api and the CLI.

pub mod config;
pub mod error;
pub mod reconcile;
pub mod reconciler;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ReconcilerConfig;
pub use error::CoreError;
pub use reconcile::{ReconciliationInput, ReconciliationPlan};
pub use reconciler::{ApplyOutcome, Observation, Reconciler};
pub use store::{StateStore, TrackedAccount, TrackedState};

// Re-export the API types consumers handle directly.
pub use ipfence_api::{AccountState, ClientCredentials, IpRule, PublicNetworkAccess, TlsMode};
