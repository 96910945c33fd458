// Client-credentials token cache
//
// Owns one bearer credential for the management API and refreshes it
// before it expires. The whole check-and-refresh sequence runs under a
// single async mutex, so a burst of callers near expiry produces exactly
// one exchange with the identity endpoint; everyone queued behind the
// first caller observes the refreshed credential.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::transport::{HttpRequest, HttpTransport};

/// Public-cloud identity authority.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com/";

/// Resource scope for Azure Resource Manager.
pub const MANAGEMENT_SCOPE: &str = "https://management.core.windows.net//.default";

/// Refresh this long before the credential actually expires, to absorb
/// clock skew and in-flight request latency.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Service principal credentials for the client-credentials grant.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: SecretString,
}

/// A bearer token and the instant it stops being valid.
#[derive(Debug)]
struct Credential {
    token: SecretString,
    expires_at: Instant,
}

impl Credential {
    /// A credential is usable while `now + margin` is still before expiry.
    fn is_fresh_at(&self, now: Instant, margin: Duration) -> bool {
        now + margin < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Expiry-aware, concurrency-safe cache for one bearer credential.
///
/// Constructed empty; the first call to [`token()`](Self::token) performs
/// the initial exchange. Share it between components with `Arc`.
#[derive(Debug)]
pub struct TokenCache {
    transport: Arc<dyn HttpTransport>,
    credentials: ClientCredentials,
    authority: Url,
    scope: String,
    margin: Duration,
    current: Mutex<Option<Credential>>,
}

impl TokenCache {
    pub fn new(transport: Arc<dyn HttpTransport>, credentials: ClientCredentials) -> Self {
        Self {
            transport,
            credentials,
            authority: Url::parse(DEFAULT_AUTHORITY).expect("static authority URL"),
            scope: MANAGEMENT_SCOPE.into(),
            margin: DEFAULT_REFRESH_MARGIN,
            current: Mutex::new(None),
        }
    }

    /// Point the cache at a different identity authority (sovereign
    /// clouds, test servers).
    pub fn with_authority(mut self, authority: Url) -> Self {
        self.authority = authority;
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    /// Return a valid bearer token, refreshing it first if it is missing
    /// or within the refresh margin of expiry.
    pub async fn token(&self) -> Result<SecretString, Error> {
        let mut current = self.current.lock().await;

        if let Some(cred) = current.as_ref() {
            if cred.is_fresh_at(Instant::now(), self.margin) {
                return Ok(cred.token.clone());
            }
        }

        let fresh = self.refresh().await?;
        let token = fresh.token.clone();
        *current = Some(fresh);
        Ok(token)
    }

    fn token_url(&self) -> Result<Url, Error> {
        let tenant = &self.credentials.tenant_id;
        Ok(self.authority.join(&format!("{tenant}/oauth2/v2.0/token"))?)
    }

    async fn refresh(&self) -> Result<Credential, Error> {
        let url = self.token_url()?;
        debug!(tenant_id = %self.credentials.tenant_id, "requesting bearer token");

        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "client_credentials")
            .append_pair("client_id", &self.credentials.client_id)
            .append_pair("client_secret", self.credentials.client_secret.expose_secret())
            .append_pair("scope", &self.scope)
            .finish();

        let request = HttpRequest::new(Method::POST, url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form);

        let issued_at = Instant::now();
        let resp = self.transport.execute(request).await?;
        let body = resp
            .into_body(|status, body| Error::Authentication {
                status: status.as_u16(),
                body,
            })
            .inspect_err(|e| warn!(error = %e, "token exchange failed"))?;

        let parsed: TokenResponse =
            serde_json::from_slice(&body).map_err(|e| Error::Deserialization {
                message: format!("invalid token response: {e}"),
                body: String::from_utf8_lossy(&body).into_owned(),
            })?;

        let expires_at = issued_at
            .checked_add(Duration::from_secs(parsed.expires_in))
            .ok_or_else(|| Error::Deserialization {
                message: format!("token lifetime out of range: {}s", parsed.expires_in),
                // The body carries a usable token.
                body: String::new(),
            })?;

        debug!(expires_in = parsed.expires_in, "bearer token refreshed");
        Ok(Credential {
            token: SecretString::from(parsed.access_token),
            expires_at,
        })
    }
}
