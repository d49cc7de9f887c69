use std::path::PathBuf;

use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use push_notify::{build_message, send, NotifyConfig, NotifyError, PushEvent};

fn config(webhook_url: String) -> NotifyConfig {
    NotifyConfig {
        webhook_url,
        repo_slug: Some("acme/backend".to_string()),
        ref_override: None,
        compare_override: None,
        event_path: PathBuf::from("/tmp/event.json"),
    }
}

fn push_event() -> PushEvent {
    serde_json::from_str(
        r#"{
            "ref": "refs/heads/main",
            "repository": {
                "name": "backend",
                "full_name": "acme/backend",
                "html_url": "https://github.com/acme/backend"
            },
            "commits": [],
            "pusher": { "name": "ada" },
            "sender": { "login": "ada", "html_url": "", "avatar_url": "" },
            "compare": "https://github.com/acme/backend/compare/a...b"
        }"#,
    )
    .unwrap()
}

#[tokio::test]
async fn test_send_posts_discord_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhook"))
        .and(body_partial_json(serde_json::json!({ "username": "GitHub" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let cfg = config(format!("{}/webhook", server.uri()));
    let message = build_message(&cfg, &push_event());
    send(&cfg.webhook_url, &message).await.unwrap();
}

#[tokio::test]
async fn test_send_surfaces_http_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let cfg = config(format!("{}/webhook", server.uri()));
    let message = build_message(&cfg, &push_event());
    let err = send(&cfg.webhook_url, &message).await.unwrap_err();
    assert!(matches!(err, NotifyError::Send(_)));
}

#[tokio::test]
async fn test_send_surfaces_connection_error() {
    // Nothing listens here.
    let cfg = config("http://127.0.0.1:9/webhook".to_string());
    let message = build_message(&cfg, &push_event());
    let err = send(&cfg.webhook_url, &message).await.unwrap_err();
    assert!(matches!(err, NotifyError::Send(_)));
}
