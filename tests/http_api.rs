use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};

use repowatch::infrastructure::{
    document_state::DocumentState, memory_store::InMemoryDocumentStore,
};
use repowatch::interfaces::http_api::{build_router, ApiState};

/// Serves the API on an ephemeral port and returns its base URL.
async fn serve(api_token: Option<&str>) -> String {
    let store = InMemoryDocumentStore::new();
    let state = DocumentState::open(Arc::new(store)).await.unwrap();
    let router = build_router(ApiState {
        registry: Arc::new(state),
        api_token: api_token.map(str::to_string),
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn health_is_open() {
    let base = serve(Some("secret")).await;
    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn watch_lifecycle() {
    let base = serve(None).await;
    let http = reqwest::Client::new();

    let resp = http
        .post(format!("{base}/watches"))
        .json(&json!({ "type": "repo", "target": "acme/widget", "channel": "42" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.unwrap();
    assert_eq!(created["id"], "repo:acme/widget");
    assert_eq!(created["type"], "repo");

    let resp = http
        .post(format!("{base}/watches"))
        .json(&json!({ "type": "repo", "target": "ACME/widget" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let list: Value = http
        .get(format!("{base}/watches"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    let resp = http
        .delete(format!("{base}/watches/repo:acme/widget"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = http
        .delete(format!("{base}/watches/repo:acme/widget"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_requests_are_rejected() {
    let base = serve(None).await;
    let http = reqwest::Client::new();

    let resp = http
        .post(format!("{base}/watches"))
        .json(&json!({ "type": "org", "target": "acme" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = http
        .post(format!("{base}/watches"))
        .json(&json!({ "type": "repo", "target": "widget" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // missing target
    let resp = http
        .post(format!("{base}/watches"))
        .json(&json!({ "type": "user" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = http
        .post(format!("{base}/watches"))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn token_is_required_when_configured() {
    let base = serve(Some("secret")).await;
    let http = reqwest::Client::new();

    let resp = http.get(format!("{base}/watches")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = http
        .get(format!("{base}/watches"))
        .bearer_auth("secret")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
