//! End-to-end tests for the alarm endpoints.

use std::sync::Arc;
use std::time::Duration;

use alarms::config::HttpSettings;
use alarms::http::{ErrorBody, X_REQUEST_ID};
use reqwest::StatusCode;
use serde_json::json;

mod common;

use common::{client, start_relay, start_relay_with, RecordingMailer, TEST_TOKEN};

#[tokio::test]
async fn test_ping() {
    let (addr, shutdown) = start_relay(Arc::new(RecordingMailer::default())).await;

    let res = client().get(format!("http://{}/ping", addr)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key(X_REQUEST_ID.as_str()));
    assert_eq!(res.text().await.unwrap(), "pong");

    shutdown.trigger();
}

#[tokio::test]
async fn test_valid_alarm_is_mailed() {
    let mailer = Arc::new(RecordingMailer::default());
    let (addr, shutdown) = start_relay(mailer.clone()).await;

    let res = client()
        .post(format!("http://{}/alarms", addr))
        .json(&json!({
            "service": "billing",
            "category": "database",
            "message": "replica lag above 30s",
            "token": TEST_TOKEN,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].from, "alarms@example.com");
    assert_eq!(sent[0].to, vec!["alarms-test@example.com".to_string()]);
    assert_eq!(sent[0].subject, "billing:database");
    assert_eq!(sent[0].body, "replica lag above 30s");

    shutdown.trigger();
}

#[tokio::test]
async fn test_wrong_token_is_rejected() {
    let mailer = Arc::new(RecordingMailer::default());
    let (addr, shutdown) = start_relay(mailer.clone()).await;

    let res = client()
        .post(format!("http://{}/alarms", addr))
        .json(&json!({
            "service": "billing",
            "category": "database",
            "message": "replica lag",
            "token": "guessed",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = res.json().await.unwrap();
    assert_eq!(body.message, "token is invalid");
    assert_eq!(body.category, None);
    assert!(mailer.sent().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_malformed_body_is_json_parse() {
    let mailer = Arc::new(RecordingMailer::default());
    let (addr, shutdown) = start_relay(mailer.clone()).await;

    let res = client()
        .post(format!("http://{}/alarms", addr))
        .header("content-type", "application/json")
        .body("{\"service\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = res.json().await.unwrap();
    assert_eq!(body.status_code, 400);
    assert_eq!(body.category.as_deref(), Some("json-parse"));
    assert!(mailer.sent().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_oversized_message_is_validate_error() {
    let mailer = Arc::new(RecordingMailer::default());
    let (addr, shutdown) = start_relay(mailer.clone()).await;

    let res = client()
        .post(format!("http://{}/alarms", addr))
        .json(&json!({
            "service": "billing",
            "category": "database",
            "message": "x".repeat(501),
            "token": TEST_TOKEN,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = res.json().await.unwrap();
    assert_eq!(body.category.as_deref(), Some("validate"));
    assert!(body.message.contains("message"));
    assert!(mailer.sent().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_mail_failure_is_server_error() {
    let (addr, shutdown) = start_relay(Arc::new(RecordingMailer::failing())).await;

    let res = client()
        .post(format!("http://{}/alarms", addr))
        .json(&json!({
            "service": "billing",
            "category": "database",
            "message": "replica lag",
            "token": TEST_TOKEN,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = res.json().await.unwrap();
    assert_eq!(body.category.as_deref(), Some("mail"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_oversized_body_is_json_error() {
    let mailer = Arc::new(RecordingMailer::default());
    let (addr, shutdown) = start_relay(mailer.clone()).await;

    let res = client()
        .post(format!("http://{}/alarms", addr))
        .header("content-type", "application/json")
        .body("x".repeat(70 * 1024))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        res.headers().get("content-type").unwrap(),
        "application/json"
    );
    let body: ErrorBody = res.json().await.unwrap();
    assert_eq!(body.status_code, 413);
    assert_eq!(body.category.as_deref(), Some("request"));
    assert!(mailer.sent().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_slow_request_times_out_with_json_error() {
    let mailer = Arc::new(RecordingMailer::slow(Duration::from_secs(5)));
    let settings = HttpSettings {
        timeout: Duration::from_millis(100),
        ..HttpSettings::default()
    };
    let (addr, shutdown) = start_relay_with(mailer.clone(), settings).await;

    let res = client()
        .post(format!("http://{}/alarms", addr))
        .json(&json!({
            "service": "billing",
            "category": "database",
            "message": "replica lag",
            "token": TEST_TOKEN,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::REQUEST_TIMEOUT);
    assert!(res.headers().contains_key(X_REQUEST_ID.as_str()));
    let body: ErrorBody = res.json().await.unwrap();
    assert_eq!(body.status_code, 408);
    assert_eq!(body.category.as_deref(), Some("timeout"));
    assert!(mailer.sent().is_empty());

    shutdown.trigger();
}
