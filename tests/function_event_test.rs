use refi_desk::app::function::{handle_event, FunctionEvent};
use refi_desk::{build_dispatcher, AppConfig, InMemorySheetStore};
use serde_json::{json, Value};
use std::sync::Arc;

fn dispatcher() -> refi_desk::Dispatcher<InMemorySheetStore> {
    let store = InMemorySheetStore::new();
    store.seed(
        "Freddie_Mac_Rate",
        &[&["Date", "30-Year Fixed Rate"], &["2026-10-08", "5.00%"]],
    );
    let config = AppConfig::from_toml_str(
        r#"
[sheets]
spreadsheet_id = "sheet-123"
access_token = "test-token"
"#,
    )
    .unwrap();
    build_dispatcher(Arc::new(store), &config)
}

fn event(method: &str, body: Option<Value>) -> FunctionEvent {
    serde_json::from_value(json!({
        "httpMethod": method,
        "path": "/.netlify/functions/google-sheets",
        "body": body.map(|b| b.to_string()),
        "headers": { "origin": "https://academy.example.com" }
    }))
    .unwrap()
}

#[tokio::test]
async fn test_options_returns_cors_headers_and_empty_body() {
    let response = handle_event(&dispatcher(), event("OPTIONS", None)).await;

    assert_eq!(response.status_code, 200);
    assert!(response.body.is_empty());
    assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
    assert_eq!(response.headers["Access-Control-Allow-Headers"], "Content-Type");
}

#[tokio::test]
async fn test_post_dispatches_action() {
    let response = handle_event(
        &dispatcher(),
        event("POST", Some(json!({ "action": "fetchFreddieMacRates" }))),
    )
    .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.headers["Content-Type"], "application/json");
    let body: Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["data"][0]["30-Year Fixed Rate"], "5.00%");
}

#[tokio::test]
async fn test_missing_body_is_invalid_input() {
    let response = handle_event(&dispatcher(), event("POST", None)).await;

    assert_eq!(response.status_code, 400);
    let body: Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["errorType"], "InvalidInput");
    assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
}

#[test]
fn test_response_serializes_in_gateway_shape() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let response = runtime.block_on(handle_event(&dispatcher(), event("OPTIONS", None)));

    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["statusCode"], 200);
    assert!(value["headers"].is_object());
    assert_eq!(value["body"], "");
}
