// Account management client
//
// Authenticated reads and partial updates of a Cosmos DB account through
// Azure Resource Manager. A patch returns immediately with an operation
// handle; waiting for it is the poller's job.

use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use tracing::{debug, info};
use url::Url;

use crate::auth::TokenCache;
use crate::error::Error;
use crate::models::{AccountResponse, AccountState, IpRule, IpRulesPatch, IpRulesPatchProperties, Operation};
use crate::transport::{HttpRequest, HttpTransport};

/// Public-cloud Resource Manager endpoint.
pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";

/// API version used for database account reads and patches.
pub const API_VERSION: &str = "2025-04-15";

/// Header carrying the status URL of an accepted asynchronous mutation.
pub const ASYNC_OPERATION_HEADER: &str = "Azure-AsyncOperation";

/// Reads and patches database accounts.
///
/// Holds no per-account state, so one instance serves any number of
/// accounts concurrently. Overlapping mutations of the *same* account are
/// the caller's responsibility; no optimistic-concurrency check is made.
#[derive(Debug, Clone)]
pub struct AccountClient {
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<TokenCache>,
    endpoint: Url,
    api_version: String,
}

impl AccountClient {
    pub fn new(transport: Arc<dyn HttpTransport>, tokens: Arc<TokenCache>) -> Self {
        Self {
            transport,
            tokens,
            endpoint: Url::parse(DEFAULT_MANAGEMENT_ENDPOINT).expect("static management URL"),
            api_version: API_VERSION.into(),
        }
    }

    /// Target a different Resource Manager endpoint (sovereign clouds,
    /// test servers).
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// `{endpoint}{account_id}?api-version=...`
    ///
    /// The account id is an absolute ARM path
    /// (`/subscriptions/.../databaseAccounts/name`).
    fn account_url(&self, account_id: &str) -> Result<Url, Error> {
        if !account_id.starts_with('/') || account_id.contains(['?', '#']) {
            return Err(Error::InvalidAccountId {
                id: account_id.into(),
            });
        }
        let base = self.endpoint.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}{account_id}"))?;
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }

    async fn authorized(&self, request: HttpRequest) -> Result<HttpRequest, Error> {
        let token = self.tokens.token().await?;
        request.bearer(token.expose_secret())
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Fetch a fresh snapshot of the account.
    ///
    /// A 404 becomes [`Error::NotFound`] so callers can tell "the account is
    /// gone" apart from transient or permission failures.
    pub async fn read_account(&self, account_id: &str) -> Result<AccountState, Error> {
        let url = self.account_url(account_id)?;
        debug!("GET {url}");

        let request = self.authorized(HttpRequest::get(url)).await?;
        let resp = self.transport.execute(request).await?;
        let body = resp.into_body(|status, body| {
            if status == StatusCode::NOT_FOUND {
                Error::NotFound {
                    id: account_id.into(),
                }
            } else {
                Error::Remote {
                    status: status.as_u16(),
                    body,
                }
            }
        })?;

        let parsed: AccountResponse =
            serde_json::from_slice(&body).map_err(|e| Error::Deserialization {
                message: format!("invalid account response: {e}"),
                body: String::from_utf8_lossy(&body).into_owned(),
            })?;
        Ok(parsed.into())
    }

    /// Replace the account's IP rules with `rules`.
    ///
    /// Sends a partial update containing only `properties.ipRules`. On
    /// acceptance returns the operation handle from the
    /// `Azure-AsyncOperation` header; the mutation is not finished yet.
    pub async fn submit_ip_rules(
        &self,
        account_id: &str,
        rules: &[IpRule],
    ) -> Result<Operation, Error> {
        let url = self.account_url(account_id)?;
        let payload = serde_json::to_vec(&IpRulesPatch {
            properties: IpRulesPatchProperties { ip_rules: rules },
        })
        .map_err(|e| Error::Deserialization {
            message: format!("failed to encode patch body: {e}"),
            body: String::new(),
        })?;

        info!(
            account_id,
            rules = ?rules.iter().map(IpRule::as_str).collect::<Vec<_>>(),
            "updating IP rules"
        );
        debug!("PATCH {url}");

        let request = HttpRequest::new(Method::PATCH, url)
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .body(payload);
        let request = self.authorized(request).await?;
        let resp = self.transport.execute(request).await?;

        let status_url = resp
            .header(ASYNC_OPERATION_HEADER)
            .and_then(|raw| Url::parse(raw).ok());
        resp.into_body(|status, body| Error::Remote {
            status: status.as_u16(),
            body,
        })?;

        let status_url = status_url.ok_or(Error::MissingOperationUrl)?;
        debug!(%status_url, "asynchronous operation accepted");
        Ok(Operation::new(status_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ClientCredentials;
    use crate::transport::TransportConfig;

    fn client() -> AccountClient {
        let transport = TransportConfig::default()
            .build_transport()
            .expect("default transport");
        let tokens = Arc::new(TokenCache::new(
            Arc::clone(&transport),
            ClientCredentials {
                tenant_id: "t".into(),
                client_id: "c".into(),
                client_secret: "s".to_string().into(),
            },
        ));
        AccountClient::new(transport, tokens)
    }

    #[test]
    fn account_url_appends_api_version() {
        let url = client()
            .account_url("/subscriptions/s/resourceGroups/rg/providers/Microsoft.DocumentDB/databaseAccounts/acct")
            .expect("valid id");
        assert_eq!(
            url.as_str(),
            "https://management.azure.com/subscriptions/s/resourceGroups/rg/providers/Microsoft.DocumentDB/databaseAccounts/acct?api-version=2025-04-15"
        );
    }

    #[test]
    fn relative_account_id_is_rejected() {
        let err = client().account_url("subscriptions/s").expect_err("must fail");
        assert!(matches!(err, Error::InvalidAccountId { .. }));
    }

    #[test]
    fn query_and_fragment_characters_are_rejected() {
        for id in [
            "/subscriptions/s/databaseAccounts/acct?api-version=1999-01-01",
            "/subscriptions/s/databaseAccounts/acct#frag",
        ] {
            let err = client().account_url(id).expect_err("must fail");
            assert!(matches!(err, Error::InvalidAccountId { .. }), "{id}");
        }
    }
}
