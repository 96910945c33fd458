// Wire and domain types for Cosmos DB account IP rules and
// asynchronous operation status.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::Display;
use url::Url;

// ── IP rules ─────────────────────────────────────────────────────────

/// A single IP address or CIDR range on an account's allow-list.
///
/// An empty address is the service's "no rule" sentinel and never takes
/// part in comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IpRule {
    #[serde(rename = "ipAddressOrRange", default)]
    pub address: String,
}

impl IpRule {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    /// Whether this is the empty "no rule" sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.address.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.address
    }
}

impl fmt::Display for IpRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

impl From<&str> for IpRule {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

impl From<String> for IpRule {
    fn from(address: String) -> Self {
        Self { address }
    }
}

// ── Account ──────────────────────────────────────────────────────────

/// Whether the account accepts traffic from public networks at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
pub enum PublicNetworkAccess {
    #[default]
    Enabled,
    Disabled,
    /// Any value this client does not know (e.g. `SecuredByPerimeter`).
    #[serde(other)]
    Unrecognized,
}

impl PublicNetworkAccess {
    pub fn is_enabled(self) -> bool {
        self == Self::Enabled
    }
}

/// Snapshot of an account's network configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountState {
    pub id: String,
    pub ip_rules: Vec<IpRule>,
    pub public_network_access: PublicNetworkAccess,
}

/// `GET` response shape for a database account.
#[derive(Debug, Deserialize)]
pub(crate) struct AccountResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub properties: Option<AccountProperties>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccountProperties {
    #[serde(default)]
    pub ip_rules: Vec<IpRule>,
    #[serde(default)]
    pub public_network_access: PublicNetworkAccess,
}

impl From<AccountResponse> for AccountState {
    fn from(resp: AccountResponse) -> Self {
        let props = resp.properties.unwrap_or_default();
        Self {
            id: resp.id,
            ip_rules: props.ip_rules,
            public_network_access: props.public_network_access,
        }
    }
}

/// `PATCH` body. Only `ipRules` is sent so unrelated account settings
/// are left alone.
#[derive(Debug, Serialize)]
pub(crate) struct IpRulesPatch<'a> {
    pub properties: IpRulesPatchProperties<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IpRulesPatchProperties<'a> {
    pub ip_rules: &'a [IpRule],
}

// ── Operations ───────────────────────────────────────────────────────

/// Classified state of a long-running operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum OperationStatus {
    Pending,
    Succeeded,
    Failed,
}

impl OperationStatus {
    /// Classify a raw status string.
    ///
    /// Unknown values are terminal failures so a poll loop can never spin
    /// on a status it does not understand.
    pub fn classify(raw: &str) -> Self {
        match raw {
            "InProgress" | "Enqueued" | "Dequeued" => Self::Pending,
            "Succeeded" => Self::Succeeded,
            _ => Self::Failed,
        }
    }
}

/// Handle to an accepted mutation, tracked through its status URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub status_url: Url,
    pub status: OperationStatus,
}

impl Operation {
    pub fn new(status_url: Url) -> Self {
        Self {
            status_url,
            status: OperationStatus::Pending,
        }
    }
}

/// Poll response shape.
#[derive(Debug, Deserialize)]
pub(crate) struct PollResponse {
    pub status: String,
}
