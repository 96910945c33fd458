// Scripted in-memory transport shared by the integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;

use ipfence_api::{ClientCredentials, Error, HttpRequest, HttpResponse, HttpTransport, TokenCache};

/// Serves token requests from a fixed response and everything else from a
/// queue, recording every request it sees.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    token_expires_in: Mutex<u64>,
    token_delay: Mutex<Duration>,
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
    token_calls: AtomicUsize,
    other_calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(token_expires_in: u64) -> Arc<Self> {
        Arc::new(Self {
            token_expires_in: Mutex::new(token_expires_in),
            ..Self::default()
        })
    }

    /// Make each token exchange take this long (simulated network latency).
    pub fn set_token_delay(&self, delay: Duration) {
        *self.token_delay.lock().unwrap() = delay;
    }

    pub fn push(&self, response: HttpResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn push_status(&self, status: &str) {
        self.push(HttpResponse::new(
            StatusCode::OK,
            json!({ "status": status }).to_string(),
        ));
    }

    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    pub fn other_calls(&self) -> usize {
        self.other_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        self.requests.lock().unwrap().push(request.clone());

        if request.url.path().ends_with("/oauth2/v2.0/token") {
            let n = self.token_calls.fetch_add(1, Ordering::SeqCst) + 1;
            let delay = *self.token_delay.lock().unwrap();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let expires_in = *self.token_expires_in.lock().unwrap();
            return Ok(HttpResponse::new(
                StatusCode::OK,
                json!({ "access_token": format!("token-{n}"), "expires_in": expires_in })
                    .to_string(),
            ));
        }

        self.other_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.responses.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| HttpResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "script exhausted")))
    }
}

pub fn credentials() -> ClientCredentials {
    ClientCredentials {
        tenant_id: "tenant-1".into(),
        client_id: "client-1".into(),
        client_secret: "s3cret".to_string().into(),
    }
}

pub fn token_cache(transport: &Arc<ScriptedTransport>) -> Arc<TokenCache> {
    Arc::new(TokenCache::new(
        Arc::clone(transport) as Arc<dyn HttpTransport>,
        credentials(),
    ))
}
