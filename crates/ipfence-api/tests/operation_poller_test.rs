#![allow(clippy::unwrap_used)]
// Poll loop behaviour against a scripted transport on paused time.

mod common;

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;
use url::Url;

use common::{ScriptedTransport, token_cache};
use ipfence_api::{Error, HttpResponse, HttpTransport, Operation, OperationPoller, OperationStatus};

fn poller(transport: &Arc<ScriptedTransport>) -> OperationPoller {
    OperationPoller::new(
        Arc::clone(transport) as Arc<dyn HttpTransport>,
        token_cache(transport),
    )
}

fn operation() -> Operation {
    Operation::new(Url::parse("https://management.azure.test/operations/op-1").unwrap())
}

#[tokio::test(start_paused = true)]
async fn test_pending_sequence_then_success() {
    let transport = ScriptedTransport::new(3600);
    for status in ["Enqueued", "Dequeued", "InProgress", "Succeeded"] {
        transport.push_status(status);
    }
    let mut op = operation();

    let started = tokio::time::Instant::now();
    poller(&transport)
        .wait(&mut op, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(transport.other_calls(), 4);
    assert_eq!(op.status, OperationStatus::Succeeded);
    assert_eq!(started.elapsed(), Duration::from_secs(40));
}

#[tokio::test(start_paused = true)]
async fn test_failed_status_is_poll_failure() {
    let transport = ScriptedTransport::new(3600);
    transport.push_status("InProgress");
    transport.push(HttpResponse::new(
        StatusCode::OK,
        r#"{"status":"Failed","error":{"code":"BadRequest","message":"invalid CIDR"}}"#,
    ));
    let mut op = operation();

    let result = poller(&transport)
        .wait(&mut op, &CancellationToken::new())
        .await;

    match result {
        Err(Error::PollFailure { ref raw }) => {
            assert!(raw.contains("invalid CIDR"), "raw: {raw}");
        }
        other => panic!("expected PollFailure, got: {other:?}"),
    }
    assert_eq!(transport.other_calls(), 2);
    assert_eq!(op.status, OperationStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_status_fails_closed() {
    let transport = ScriptedTransport::new(3600);
    transport.push_status("Canceled");
    let mut op = operation();

    let result = poller(&transport)
        .wait(&mut op, &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(Error::PollFailure { .. })), "got: {result:?}");
    assert_eq!(transport.other_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unparseable_payload_fails_closed() {
    let transport = ScriptedTransport::new(3600);
    transport.push(HttpResponse::new(StatusCode::OK, "<html>gateway</html>"));
    let mut op = operation();

    let result = poller(&transport)
        .wait(&mut op, &CancellationToken::new())
        .await;

    match result {
        Err(Error::PollFailure { ref raw }) => assert_eq!(raw, "<html>gateway</html>"),
        other => panic!("expected PollFailure, got: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_poll_http_error_is_not_retried() {
    let transport = ScriptedTransport::new(3600);
    transport.push(HttpResponse::new(StatusCode::SERVICE_UNAVAILABLE, "busy"));
    transport.push_status("Succeeded");
    let mut op = operation();

    let result = poller(&transport)
        .wait(&mut op, &CancellationToken::new())
        .await;

    assert!(
        matches!(result, Err(Error::Remote { status: 503, .. })),
        "got: {result:?}"
    );
    assert_eq!(transport.other_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_mid_wait_skips_final_poll() {
    let transport = ScriptedTransport::new(3600);
    transport.push_status("InProgress");
    transport.push_status("Succeeded");
    let mut op = operation();
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        // After the first poll (t=10s), during the second wait.
        tokio::time::sleep(Duration::from_secs(15)).await;
        trigger.cancel();
    });

    let result = poller(&transport).wait(&mut op, &cancel).await;

    assert!(matches!(result, Err(Error::Cancelled)), "got: {result:?}");
    assert_eq!(transport.other_calls(), 1);
    assert_eq!(op.status, OperationStatus::Pending);
}

#[tokio::test(start_paused = true)]
async fn test_already_cancelled_never_polls() {
    let transport = ScriptedTransport::new(3600);
    transport.push_status("Succeeded");
    let mut op = operation();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = poller(&transport).wait(&mut op, &cancel).await;

    assert!(matches!(result, Err(Error::Cancelled)));
    assert_eq!(transport.other_calls(), 0);
    assert_eq!(transport.token_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_token_refreshed_during_long_operation() {
    // Token lives 120s; refresh is due from t=60s on.
    let transport = ScriptedTransport::new(120);
    for _ in 0..9 {
        transport.push_status("InProgress");
    }
    transport.push_status("Succeeded");
    let mut op = operation();

    poller(&transport)
        .wait(&mut op, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(transport.other_calls(), 10);
    let tokens_used: Vec<String> = transport
        .requests()
        .iter()
        .filter(|r| r.url.path().starts_with("/operations/"))
        .filter_map(|r| r.headers.get("authorization"))
        .map(|v| v.to_str().unwrap().to_owned())
        .collect();
    assert_eq!(tokens_used.first().map(String::as_str), Some("Bearer token-1"));
    assert_eq!(tokens_used.last().map(String::as_str), Some("Bearer token-2"));
    assert_eq!(transport.token_calls(), 2);
}
