//! Integration tests for `/api/v1/images`.

mod common;

use axum::http::StatusCode;
use common::{body_json, created, get, post_json, succeeded, TestApp, PROCESSING};
use serde_json::json;

const GENERATE: &str = "/api/v1/images/generate";

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn generate_returns_image_url() {
    let app = TestApp::new();
    app.backend
        .push_create(201, &created("job-9"))
        .push_status(200, PROCESSING)
        .push_status(200, &succeeded("https://x/img.png"));

    let response = post_json(
        app.router(),
        GENERATE,
        json!({ "prompt": "a red fox", "style": "watercolor" }),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["jobId"], "job-9");
    assert_eq!(json["data"]["status"], "succeeded");
    assert_eq!(json["data"]["imageUrl"], "https://x/img.png");
    assert_eq!(json["data"]["attempts"], 2);
    assert_eq!(app.backend.prompts(), vec!["a red fox, watercolor style"]);
}

#[tokio::test]
async fn generate_records_history_for_user() {
    let app = TestApp::new();
    app.backend
        .push_create(201, &created("job-1"))
        .push_status(200, &succeeded("https://x/1.png"));

    let response = post_json(
        app.router(),
        GENERATE,
        json!({ "prompt": "a red fox" }),
        Some("ada@example.com"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let entries = app.state.history.list("ada@example.com").unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].prompt, "a red fox");
}

#[tokio::test]
async fn invalid_body_is_rejected_without_remote_call() {
    let app = TestApp::new();

    let response = post_json(
        app.router(),
        GENERATE,
        json!({ "prompt": "x", "steps": 25 }),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(app.backend.prompts().is_empty());
}

#[tokio::test]
async fn exhausted_credentials_map_to_429() {
    let app = TestApp::new();
    app.backend.push_create(429, "").push_create(402, "");

    let response = post_json(app.router(), GENERATE, json!({ "prompt": "x" }), None).await;

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(response).await;
    assert_eq!(json["code"], "CREDENTIALS_EXHAUSTED");
    assert_eq!(json["retryable"], true);
}

#[tokio::test]
async fn revoked_access_maps_to_403() {
    let app = TestApp::new();
    app.backend.push_create(403, "");

    let response = post_json(app.router(), GENERATE, json!({ "prompt": "x" }), None).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "ACCESS_REVOKED");
    assert_eq!(json["retryable"], false);
}

#[tokio::test]
async fn remote_failure_maps_to_502_with_detail() {
    let app = TestApp::new();
    app.backend
        .push_create(201, &created("job-1"))
        .push_status(200, r#"{"status":"failed","error":"NSFW content detected"}"#);

    let response = post_json(app.router(), GENERATE, json!({ "prompt": "x" }), None).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["code"], "GENERATION_FAILED");
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("NSFW content detected"));
}

#[tokio::test]
async fn shutdown_cancels_generation() {
    let app = TestApp::new();
    app.backend.push_create(201, &created("job-1"));
    app.state.shutdown.cancel();

    let response = post_json(app.router(), GENERATE, json!({ "prompt": "x" }), None).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["code"], "CANCELLED");
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn templates_catalog() {
    let app = TestApp::new();
    let response = get(app.router(), "/api/v1/images/templates").await;

    assert_eq!(response.status(), StatusCode::OK);
    let data = &body_json(response).await["data"];

    let keys: Vec<&str> = data["templates"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["key"].as_str().unwrap())
        .collect();
    assert_eq!(
        keys,
        vec!["portrait", "landscape", "concept", "product", "fantasy", "abstract"]
    );
    assert_eq!(data["samplePrompts"].as_array().unwrap().len(), 5);
    assert_eq!(data["steps"], json!([20, 30, 50]));
    assert!(data["styles"]
        .as_array()
        .unwrap()
        .contains(&json!("3d-render")));
}

#[tokio::test]
async fn template_lookup_by_key() {
    let app = TestApp::new();
    let response = get(app.router(), "/api/v1/images/templates/landscape").await;

    assert_eq!(response.status(), StatusCode::OK);
    let data = &body_json(response).await["data"];
    assert_eq!(data["key"], "landscape");
    assert!(data["prompt"].as_str().unwrap().contains("mountain landscape"));
}

#[tokio::test]
async fn unknown_template_is_404() {
    let app = TestApp::new();
    let response = get(app.router(), "/api/v1/images/templates/cubism").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["retryable"], false);
}
