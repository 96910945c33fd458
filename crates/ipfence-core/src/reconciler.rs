// ── Reconciler ──
//
// Lifecycle glue between the account API, the operation poller and the
// pure diff engine. One reconciler serves any number of accounts; all of
// them share a single token cache.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use ipfence_api::{
    AccountClient, AccountState, HttpTransport, IpRule, OperationPoller, TlsMode, TokenCache,
    TransportConfig,
};

use crate::config::ReconcilerConfig;
use crate::error::CoreError;
use crate::reconcile::{self, ReconciliationInput, ReconciliationPlan};

// ── Results ──────────────────────────────────────────────────────────

/// What a refresh found on the remote account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// The account no longer exists; local tracking should be dropped.
    Gone,
    /// The account exists. `tracked` is the previously tracked set pruned
    /// to rules still present remotely.
    Present {
        resource_id: String,
        tracked: Vec<IpRule>,
    },
}

/// Result of `apply` or `release`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOutcome {
    pub resource_id: String,
    pub plan: ReconciliationPlan,
    /// A patch was submitted and its operation succeeded.
    pub changed: bool,
}

// ── Reconciler ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Reconciler {
    accounts: AccountClient,
    poller: OperationPoller,
}

impl Reconciler {
    /// Build a reconciler backed by the reqwest transport.
    pub fn new(config: &ReconcilerConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: config
                .ca_cert
                .clone()
                .map_or(TlsMode::System, TlsMode::CustomCa),
            timeout: config.timeout,
            ..TransportConfig::default()
        }
        .build_transport()?;
        Ok(Self::with_transport(config, transport))
    }

    /// Build a reconciler over an arbitrary transport.
    pub fn with_transport(config: &ReconcilerConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let tokens = Arc::new(
            TokenCache::new(Arc::clone(&transport), config.credentials.clone())
                .with_authority(config.authority.clone()),
        );

        let accounts = AccountClient::new(Arc::clone(&transport), Arc::clone(&tokens))
            .with_endpoint(config.management_endpoint.clone())
            .with_api_version(config.api_version.clone());
        let poller =
            OperationPoller::new(transport, tokens).with_interval(config.effective_poll_interval());

        Self { accounts, poller }
    }

    // ── Read paths ───────────────────────────────────────────────────

    /// Fetch the account as it is now.
    pub async fn read(
        &self,
        account_id: &str,
        cancel: &CancellationToken,
    ) -> Result<AccountState, CoreError> {
        race(cancel, self.accounts.read_account(account_id)).await
    }

    /// Refresh tracked rules against the remote account.
    pub async fn observe(
        &self,
        account_id: &str,
        tracked: &[IpRule],
        cancel: &CancellationToken,
    ) -> Result<Observation, CoreError> {
        let account = match self.read_enabled(account_id, cancel).await {
            Ok(account) => account,
            Err(e) if e.is_not_found() => {
                info!(account_id, "account no longer exists");
                return Ok(Observation::Gone);
            }
            Err(e) => return Err(e),
        };

        let pruned = reconcile::observe(&account.ip_rules, tracked);
        if pruned.len() != tracked.len() {
            debug!(
                account_id,
                before = tracked.len(),
                after = pruned.len(),
                "tracked rules pruned to remote"
            );
        }
        Ok(Observation::Present {
            resource_id: resource_id(&account, account_id),
            tracked: pruned,
        })
    }

    /// Compute the plan for `desired` without mutating anything.
    pub async fn plan(
        &self,
        account_id: &str,
        tracked: Option<&[IpRule]>,
        desired: &[IpRule],
        cancel: &CancellationToken,
    ) -> Result<ReconciliationPlan, CoreError> {
        let account = self.read_enabled(account_id, cancel).await?;
        Ok(reconcile::plan(&ReconciliationInput {
            current_remote: &account.ip_rules,
            previously_tracked: tracked,
            desired,
        }))
    }

    // ── Mutating paths ───────────────────────────────────────────────

    /// Reconcile the account toward `desired` and wait for the change to
    /// land. `tracked` is `None` the first time an account is managed.
    pub async fn apply(
        &self,
        account_id: &str,
        tracked: Option<&[IpRule]>,
        desired: &[IpRule],
        cancel: &CancellationToken,
    ) -> Result<ApplyOutcome, CoreError> {
        let account = self.read_enabled(account_id, cancel).await?;
        let plan = reconcile::plan(&ReconciliationInput {
            current_remote: &account.ip_rules,
            previously_tracked: tracked,
            desired,
        });
        self.execute(&account, account_id, plan, cancel).await
    }

    /// Remove every tracked rule still present on the account.
    pub async fn release(
        &self,
        account_id: &str,
        tracked: &[IpRule],
        cancel: &CancellationToken,
    ) -> Result<ApplyOutcome, CoreError> {
        let account = self.read_enabled(account_id, cancel).await?;
        let plan = reconcile::plan_release(&account.ip_rules, tracked);
        if !plan.noop && plan.final_set.is_empty() {
            info!(account_id, "release leaves no IP rules; account becomes public");
        }
        self.execute(&account, account_id, plan, cancel).await
    }

    // ── Internals ────────────────────────────────────────────────────

    async fn read_enabled(
        &self,
        account_id: &str,
        cancel: &CancellationToken,
    ) -> Result<AccountState, CoreError> {
        let account = self.read(account_id, cancel).await?;
        if !account.public_network_access.is_enabled() {
            return Err(CoreError::PublicAccessDisabled {
                id: account_id.to_owned(),
            });
        }
        Ok(account)
    }

    async fn execute(
        &self,
        account: &AccountState,
        account_id: &str,
        plan: ReconciliationPlan,
        cancel: &CancellationToken,
    ) -> Result<ApplyOutcome, CoreError> {
        let resource_id = resource_id(account, account_id);

        if plan.public_account {
            info!(account_id, "account has no IP rules; leaving it public");
        }
        if plan.noop {
            debug!(account_id, "nothing to change");
            return Ok(ApplyOutcome {
                resource_id,
                plan,
                changed: false,
            });
        }

        for rule in &plan.to_remove {
            info!(account_id, rule = %rule, "removing IP rule");
        }
        for rule in &plan.to_add {
            info!(account_id, rule = %rule, "adding IP rule");
        }

        let mut operation =
            race(cancel, self.accounts.submit_ip_rules(account_id, &plan.final_set)).await?;
        debug!(account_id, url = %operation.status_url, "waiting for operation");
        self.poller.wait(&mut operation, cancel).await?;
        info!(
            account_id,
            added = plan.to_add.len(),
            removed = plan.to_remove.len(),
            "IP rules updated"
        );

        Ok(ApplyOutcome {
            resource_id,
            plan,
            changed: true,
        })
    }
}

fn resource_id(account: &AccountState, fallback: &str) -> String {
    if account.id.is_empty() {
        fallback.to_owned()
    } else {
        account.id.clone()
    }
}

/// Run an API call unless `cancel` fires first.
async fn race<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T, ipfence_api::Error>>,
) -> Result<T, CoreError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(CoreError::Cancelled),
        result = call => result.map_err(CoreError::from),
    }
}
