mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use maildigest::config::Config;
use maildigest::server::{create_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{config_from, STANDUP_REPLY};

fn router(config: Config) -> axum::Router {
    create_router(Arc::new(AppState {
        config,
        http: reqwest::Client::new(),
        slack: None,
    }))
}

async fn get(router: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_liveness_routes() {
    let config = config_from(&[]);

    let (status, body) = get(router(config.clone()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");

    let (status, body) = get(router(config), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "AI Email Summarizer running. Try /health or /api/cron"
    );
}

#[tokio::test]
async fn test_cron_in_demo_mode() {
    let openai = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": STANDUP_REPLY}}]
        })))
        .expect(1)
        .mount(&openai)
        .await;

    let base_url = openai.uri();
    let config = config_from(&[
        ("DEMO_MODE", "true"),
        ("SKIP_DELIVERY", "true"),
        ("MARK_AS_READ", "true"),
        ("OPENAI_API_KEY", "sk-test"),
        ("OPENAI_BASE_URL", base_url.as_str()),
    ]);

    let (status, body) = get(router(config), "/api/cron").await;
    assert_eq!(status, StatusCode::OK);

    let payload: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(payload["ok"], true);
    assert_eq!(payload["demo"], true);
    assert_eq!(payload["skipped_delivery"], true);
    assert_eq!(payload["gmail_unread_count"], 3);
    assert_eq!(payload["degraded"], false);
    assert!(payload["subject"].as_str().unwrap().starts_with("Email Digest — "));
    assert_eq!(
        payload["bullets"],
        json!([{"title": "Standup notes", "detail": "Auth shipped, analytics next"}])
    );
    assert!(payload["html_preview"]
        .as_str()
        .unwrap()
        .contains("<li><b>Standup notes</b><br>Auth shipped, analytics next</li>"));
    assert_eq!(payload["warnings"], json!([]));
}

#[tokio::test]
async fn test_cron_without_credentials_returns_error_envelope() {
    let config = config_from(&[("OPENAI_API_KEY", "sk-test")]);

    let (status, body) = get(router(config), "/api/cron").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let payload: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(payload["ok"], false);
    assert_eq!(payload["error"]["kind"], "config");
    assert!(payload["error"]["message"]
        .as_str()
        .unwrap()
        .contains("GOOGLE_CLIENT_ID"));
}

#[tokio::test]
async fn test_cron_upstream_failure_is_bad_gateway() {
    let google = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "invalid_client"})))
        .mount(&google)
        .await;

    let token_url = format!("{}/token", google.uri());
    let config = config_from(&[
        ("GOOGLE_CLIENT_ID", "id"),
        ("GOOGLE_CLIENT_SECRET", "secret"),
        ("GOOGLE_REFRESH_TOKEN", "refresh"),
        ("GOOGLE_TOKEN_URL", token_url.as_str()),
        ("OPENAI_API_KEY", "sk-test"),
    ]);

    let (status, body) = get(router(config), "/api/cron").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let payload: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(payload["error"]["kind"], "auth");
    assert!(!payload["error"]["message"].as_str().unwrap().contains("secret"));
}

#[tokio::test]
async fn test_cron_in_live_mode() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "ya29.live"})))
        .expect(2)
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages"))
        .and(query_param("maxResults", "20"))
        .and(header("authorization", "Bearer ya29.live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{"id": "m1"}, {"id": "m2"}]
        })))
        .expect(1)
        .mount(&upstream)
        .await;
    for (id, subject) in [("m1", "Standup notes"), ("m2", "Invoice Due")] {
        Mock::given(method("GET"))
            .and(path(format!("/gmail/v1/users/me/messages/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "snippet": format!("snippet {}", id),
                "payload": {"headers": [
                    {"name": "From", "value": "alice@example.com"},
                    {"name": "Subject", "value": subject}
                ]}
            })))
            .expect(1)
            .mount(&upstream)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/gmail/v1/users/me/messages/batchModify"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": STANDUP_REPLY}}]
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let token_url = format!("{}/token", upstream.uri());
    let gmail_base = format!("{}/gmail/v1", upstream.uri());
    let base_url = upstream.uri();
    let config = config_from(&[
        ("GOOGLE_CLIENT_ID", "id"),
        ("GOOGLE_CLIENT_SECRET", "secret"),
        ("GOOGLE_REFRESH_TOKEN", "refresh"),
        ("GOOGLE_TOKEN_URL", token_url.as_str()),
        ("GMAIL_API_BASE", gmail_base.as_str()),
        ("OPENAI_API_KEY", "sk-test"),
        ("OPENAI_BASE_URL", base_url.as_str()),
        ("MARK_AS_READ", "true"),
        ("FETCH_CONCURRENCY", "2"),
    ]);

    let (status, body) = get(router(config), "/api/cron").await;
    assert_eq!(status, StatusCode::OK);

    let payload: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(payload["ok"], true);
    assert_eq!(payload["demo"], false);
    assert_eq!(payload["gmail_unread_count"], 2);
    assert_eq!(payload["warnings"], json!([]));

    let requests = upstream.received_requests().await.unwrap();
    let chat = requests
        .iter()
        .find(|r| r.url.path() == "/chat/completions")
        .unwrap();
    let prompt = String::from_utf8_lossy(&chat.body);
    let first = prompt.find("Standup notes").unwrap();
    let second = prompt.find("Invoice Due").unwrap();
    assert!(first < second);
}
