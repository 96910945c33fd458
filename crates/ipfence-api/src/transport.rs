// HTTP transport capability.
//
// Every component that talks to the network goes through `HttpTransport`
// instead of a concrete `reqwest::Client`, so the token cache, account
// client and poller can be driven by scripted responses in tests.
// `ReqwestTransport` is the production implementation.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use tracing::trace;
use url::Url;

use crate::error::Error;

// ── Request / response ───────────────────────────────────────────────

/// A fully-buffered outbound request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Add a header. Invalid header values are skipped with a trace event.
    pub fn header(mut self, name: HeaderName, value: &str) -> Self {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(e) => trace!(header = %name, error = %e, "dropping invalid header value"),
        }
        self
    }

    /// Attach a bearer token. The header value is marked sensitive so it
    /// never shows up in debug output.
    pub fn bearer(mut self, token: &str) -> Result<Self, Error> {
        let mut value =
            HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| Error::InvalidToken)?;
        value.set_sensitive(true);
        self.headers.insert(reqwest::header::AUTHORIZATION, value);
        Ok(self)
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A response whose body has already been drained.
///
/// If draining failed, the failure is kept in `drain_error` rather than
/// replacing the response, so callers can merge it with whatever primary
/// error the status code implies.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub drain_error: Option<Error>,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            drain_error: None,
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_drain_error(mut self, error: Error) -> Self {
        self.drain_error = Some(error);
        self
    }

    /// Body as (lossy) UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Header value as a string, if present and valid.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Resolve the response into its body, or the error it represents.
    ///
    /// A 200 yields the body. Anything else is mapped through `on_failure`.
    /// A drain failure is joined onto the primary error instead of
    /// overriding it.
    pub fn into_body(
        self,
        on_failure: impl FnOnce(StatusCode, String) -> Error,
    ) -> Result<Bytes, Error> {
        let primary =
            (self.status != StatusCode::OK).then(|| on_failure(self.status, self.text()));
        match (primary, self.drain_error) {
            (None, None) => Ok(self.body),
            (Some(primary), None) => Err(primary),
            (None, Some(drain)) => Err(drain),
            (Some(primary), Some(drain)) => Err(primary.join(drain)),
        }
    }
}

// ── Capability ───────────────────────────────────────────────────────

/// Anything that can perform an HTTP exchange.
#[async_trait]
pub trait HttpTransport: Send + Sync + fmt::Debug {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Error>;
}

// ── reqwest-backed transport ─────────────────────────────────────────

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Additionally trust a custom CA certificate from the given PEM file
    /// (corporate proxies that re-sign traffic).
    CustomCa(PathBuf),
}

/// Transport configuration for building the HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            user_agent: concat!("ipfence/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str());

        if let TlsMode::CustomCa(path) = &self.tls {
            let cert_pem = std::fs::read(path)
                .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
            let cert = reqwest::Certificate::from_pem(&cert_pem)
                .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
            builder = builder.add_root_certificate(cert);
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Build the production transport.
    pub fn build_transport(&self) -> Result<Arc<dyn HttpTransport>, Error> {
        Ok(Arc::new(ReqwestTransport::new(self.build_client()?)))
    }
}

/// `HttpTransport` over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        trace!(method = %request.method, url = %request.url, "sending request");

        let mut builder = self
            .http
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        // The response is owned by this scope and released on every path;
        // a failure while draining it travels with the response.
        let resp = builder.send().await?;
        let status = resp.status();
        let headers = resp.headers().clone();

        Ok(match resp.bytes().await {
            Ok(body) => HttpResponse {
                status,
                headers,
                body,
                drain_error: None,
            },
            Err(e) => HttpResponse {
                status,
                headers,
                body: Bytes::new(),
                drain_error: Some(Error::Transport(e)),
            },
        })
    }
}
