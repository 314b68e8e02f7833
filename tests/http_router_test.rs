use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use refi_desk::{build_dispatcher, router, AppConfig, InMemorySheetStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> axum::Router {
    let store = InMemorySheetStore::new();
    store.seed("Users", &[&["Name", "Email"], &["Officer", "officer@example.com"]]);
    let config = AppConfig::from_toml_str(
        r#"
[sheets]
spreadsheet_id = "sheet-123"
access_token = "test-token"
"#,
    )
    .unwrap();
    router(build_dispatcher(Arc::new(store), &config))
}

async fn json_of(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_of(response).await["status"], "ok");
}

#[tokio::test]
async fn test_both_paths_dispatch() {
    for path in ["/api/sheets", "/.netlify/functions/google-sheets"] {
        let response = app()
            .oneshot(post(
                path,
                json!({ "action": "checkUserEmail", "email": "officer@example.com" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_of(response).await,
            json!({ "success": true, "data": { "exists": true } })
        );
    }
}

#[tokio::test]
async fn test_unknown_action_is_bad_request() {
    let response = app()
        .oneshot(post("/api/sheets", json!({ "action": "dance" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_of(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Unknown action: dance");
    assert_eq!(body["errorType"], "InvalidInput");
}

#[tokio::test]
async fn test_missing_action_is_bad_request() {
    let response = app()
        .oneshot(post("/api/sheets", json!({ "userEmail": "officer@example.com" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_preflight_allows_any_origin() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/sheets")
        .header(header::ORIGIN, "https://academy.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_plain_options_is_a_no_op() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/.netlify/functions/google-sheets")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cors_header_on_actions() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/sheets")
        .header(header::ORIGIN, "https://academy.example.com")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"action":"fetchFreddieMacRates"}"#))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
    assert_eq!(json_of(response).await["data"], json!([]));
}
