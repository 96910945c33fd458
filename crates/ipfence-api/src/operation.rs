// Long-running operation poller
//
// Follows an `Azure-AsyncOperation` status URL until the operation reaches
// a terminal status or the caller cancels. Only "is it done yet" is
// retried; a failed poll request ends the wait immediately.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use secrecy::ExposeSecret;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::auth::TokenCache;
use crate::error::Error;
use crate::models::{Operation, OperationStatus, PollResponse};
use crate::transport::{HttpRequest, HttpTransport};

/// Time between status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Waits for asynchronous operations to finish.
#[derive(Debug, Clone)]
pub struct OperationPoller {
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<TokenCache>,
    interval: Duration,
}

impl OperationPoller {
    pub fn new(transport: Arc<dyn HttpTransport>, tokens: Arc<TokenCache>) -> Self {
        Self {
            transport,
            tokens,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Block (cooperatively) until `operation` is terminal.
    ///
    /// Each round first waits one interval, racing the cancellation token;
    /// cancellation wins ties and returns [`Error::Cancelled`] without a
    /// final poll. `Succeeded` returns `Ok`, a pending status loops, and
    /// anything else is [`Error::PollFailure`] carrying the raw payload.
    pub async fn wait(
        &self,
        operation: &mut Operation,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        let mut attempt: u32 = 0;
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(attempt, "operation wait cancelled");
                    return Err(Error::Cancelled);
                }
                () = tokio::time::sleep(self.interval) => {}
            }

            attempt += 1;
            let (status, raw) = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                polled = self.poll_once(operation) => polled?,
            };
            operation.status = status;
            debug!(attempt, %status, raw_status = %raw, "operation status");

            match status {
                OperationStatus::Pending => {}
                OperationStatus::Succeeded => return Ok(()),
                OperationStatus::Failed => {
                    warn!(attempt, payload = %raw, "operation failed");
                    return Err(Error::PollFailure { raw });
                }
            }
        }
    }

    /// One status request. Returns the classified status and the raw body.
    ///
    /// The token is fetched every round: a long operation can outlive the
    /// credential, and the cache makes this free while it is still valid.
    async fn poll_once(&self, operation: &Operation) -> Result<(OperationStatus, String), Error> {
        let token = self.tokens.token().await?;
        let request = HttpRequest::get(operation.status_url.clone())
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/json; charset=utf-8",
            )
            .bearer(token.expose_secret())?;

        let resp = self.transport.execute(request).await?;
        let body = resp.into_body(|status: StatusCode, body| Error::Remote {
            status: status.as_u16(),
            body,
        })?;
        let raw = String::from_utf8_lossy(&body).into_owned();

        let status = serde_json::from_slice::<PollResponse>(&body)
            .map_or(OperationStatus::Failed, |parsed| {
                OperationStatus::classify(&parsed.status)
            });
        Ok((status, raw))
    }
}
