// In-memory transport for driving the reconciler without a network.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;

use ipfence_api::{Error, HttpRequest, HttpResponse, HttpTransport};
use ipfence_core::{ClientCredentials, ReconcilerConfig};

pub const ACCOUNT: &str =
    "/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.DocumentDB/databaseAccounts/acct";

/// Answers token exchanges itself and replays queued responses for
/// everything else, in order.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, response: HttpResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn push_account(&self, rules: &[&str], access: &str) {
        let rules: Vec<_> = rules
            .iter()
            .map(|r| json!({ "ipAddressOrRange": r }))
            .collect();
        self.push(HttpResponse::new(
            StatusCode::OK,
            json!({
                "id": ACCOUNT,
                "properties": { "ipRules": rules, "publicNetworkAccess": access }
            })
            .to_string(),
        ));
    }

    pub fn push_accepted(&self) {
        self.push(
            HttpResponse::new(StatusCode::OK, "{}").with_header(
                "Azure-AsyncOperation",
                "https://management.azure.com/operations/op-1?api-version=2025-04-15",
            ),
        );
    }

    pub fn push_status(&self, status: &str) {
        self.push(HttpResponse::new(
            StatusCode::OK,
            json!({ "status": status }).to_string(),
        ));
    }

    /// Non-token requests, in the order they were made.
    pub fn calls(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| !is_token_request(r))
            .cloned()
            .collect()
    }

    /// JSON body of the single PATCH sent, if any.
    pub fn patch_body(&self) -> Option<serde_json::Value> {
        self.calls()
            .into_iter()
            .find(|r| r.method == reqwest::Method::PATCH)
            .and_then(|r| r.body)
            .map(|b| serde_json::from_slice(&b).unwrap())
    }
}

fn is_token_request(request: &HttpRequest) -> bool {
    request.url.path().ends_with("/oauth2/v2.0/token")
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let token = is_token_request(&request);
        self.requests.lock().unwrap().push(request);

        if token {
            return Ok(HttpResponse::new(
                StatusCode::OK,
                json!({ "access_token": "token", "expires_in": 3600 }).to_string(),
            ));
        }
        let next = self.responses.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| {
            HttpResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "script exhausted")
        }))
    }
}

pub fn config() -> ReconcilerConfig {
    ReconcilerConfig::new(ClientCredentials {
        tenant_id: "tenant-1".into(),
        client_id: "client-1".into(),
        client_secret: "s3cret".to_string().into(),
    })
}
