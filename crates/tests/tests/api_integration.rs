use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Local, Timelike};
use relay_api::build_app_with_settings;
use relay_tests::{offline_config, test_settings, TEST_API_KEY};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

async fn app(dir: &TempDir) -> Router {
    build_app_with_settings(offline_config(dir.path()), test_settings(100))
        .await
        .expect("app should build")
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-api-key", TEST_API_KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(&dir)
        .await
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = json_body(response).await;
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["connectors"]["remote_notes"], false);
    assert_eq!(parsed["connectors"]["calendar"], false);
}

#[tokio::test]
async fn classify_requires_api_key() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::builder()
        .method("POST")
        .uri("/v1/classify")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "text": "notion idea" }).to_string()))
        .unwrap();

    let response = app(&dir).await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn classify_returns_intent_and_payload() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(&dir)
        .await
        .oneshot(post_json(
            "/v1/classify",
            json!({ "text": "Add a note to Notion about meeting ideas" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = json_body(response).await;
    assert_eq!(parsed["intent"], "note_remote");
    assert_eq!(parsed["payload"]["content"], "about meeting ideas");
    assert_eq!(parsed["payload"]["title"], "about meeting ideas");
}

#[tokio::test]
async fn classify_calendar_window() {
    let dir = tempfile::tempdir().unwrap();
    let today = Local::now().date_naive();
    let response = app(&dir)
        .await
        .oneshot(post_json(
            "/v1/classify",
            json!({ "text": "Add meeting at 5 pm tomorrow" }),
        ))
        .await
        .unwrap();

    let parsed = json_body(response).await;
    assert_eq!(parsed["intent"], "calendar_event");

    let start: chrono::NaiveDateTime =
        serde_json::from_value(parsed["payload"]["start"].clone()).unwrap();
    let end: chrono::NaiveDateTime =
        serde_json::from_value(parsed["payload"]["end"].clone()).unwrap();
    assert_eq!(start.hour(), 17);
    assert_eq!(end - start, Duration::hours(1));

    // Tolerate the request straddling midnight.
    assert!(start.date() == today + Duration::days(1) || start.date() == today + Duration::days(2));
}

#[tokio::test]
async fn command_writes_local_note_into_vault() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(&dir)
        .await
        .oneshot(post_json(
            "/v1/command",
            json!({ "text": "Write this in Obsidian: brain dump" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = json_body(response).await;
    assert_eq!(parsed["classification"]["intent"], "note_local");
    assert_eq!(parsed["outcome"]["success"], true);

    let written: Vec<_> = std::fs::read_dir(dir.path().join("vault"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(written.len(), 1);
    assert!(std::fs::read_to_string(&written[0])
        .unwrap()
        .contains("brain dump"));

    let history = std::fs::read_to_string(dir.path().join("history.txt")).unwrap();
    assert!(history.contains("Command: Write this in Obsidian: brain dump -> Saved to Obsidian:"));
}

#[tokio::test]
async fn unconfigured_collaborators_report_failure_in_body() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir).await;

    let notion = json_body(
        app.clone()
            .oneshot(post_json("/v1/command", json!({ "text": "notion meeting" })))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(notion["classification"]["intent"], "note_remote");
    assert_eq!(notion["outcome"]["success"], false);
    assert_eq!(notion["outcome"]["message"], "NOTION_DATABASE_ID not configured");

    let calendar = json_body(
        app.clone()
            .oneshot(post_json("/v1/command", json!({ "text": "schedule something" })))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(calendar["classification"]["intent"], "calendar_event");
    assert_eq!(
        calendar["outcome"]["message"],
        "Google credentials.json not found. See README for setup."
    );

    let unknown = json_body(
        app.oneshot(post_json("/v1/command", json!({ "text": "  hello there  " })))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(unknown["classification"]["intent"], "unknown");
    assert_eq!(unknown["classification"]["payload"]["text"], "hello there");
}

#[tokio::test]
async fn oversized_text_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(&dir)
        .await
        .oneshot(post_json("/v1/classify", json!({ "text": "a".repeat(4_001) })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn rate_limit_applies_per_client() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_app_with_settings(offline_config(dir.path()), test_settings(1))
        .await
        .unwrap();

    let first = app
        .clone()
        .oneshot(post_json("/v1/classify", json!({ "text": "hi" })))
        .await
        .unwrap();
    let second = app
        .oneshot(post_json("/v1/classify", json!({ "text": "hi" })))
        .await
        .unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn forwarded_for_header_does_not_reset_the_limit() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_app_with_settings(offline_config(dir.path()), test_settings(1))
        .await
        .unwrap();

    let from = |address: &str| {
        let mut request = post_json("/v1/classify", json!({ "text": "hi" }));
        request
            .headers_mut()
            .insert("x-forwarded-for", address.parse().unwrap());
        request
    };

    let first = app.clone().oneshot(from("10.0.0.1")).await.unwrap();
    let second = app.clone().oneshot(from("10.0.0.2")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

    let unauthenticated = Request::builder()
        .method("POST")
        .uri("/v1/classify")
        .header("content-type", "application/json")
        .header("x-api-key", "someone-else")
        .body(Body::from(json!({ "text": "hi" }).to_string()))
        .unwrap();
    let response = app.oneshot(unauthenticated).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
