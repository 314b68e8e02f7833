//! Netlify / API Gateway style function event handling.

use crate::core::dispatch::Dispatcher;
use crate::domain::ports::SheetStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionEvent {
    #[serde(default)]
    pub http_method: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

pub fn cors_headers() -> HashMap<String, String> {
    HashMap::from([
        ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
        (
            "Access-Control-Allow-Headers".to_string(),
            "Content-Type".to_string(),
        ),
        (
            "Access-Control-Allow-Methods".to_string(),
            "GET, POST, PUT, DELETE, OPTIONS".to_string(),
        ),
    ])
}

pub async fn handle_event<S: SheetStore>(
    dispatcher: &Dispatcher<S>,
    event: FunctionEvent,
) -> FunctionResponse {
    let mut headers = cors_headers();

    if event.http_method.eq_ignore_ascii_case("OPTIONS") {
        return FunctionResponse {
            status_code: 200,
            headers,
            body: String::new(),
        };
    }

    tracing::info!("📨 {} {}", event.http_method, event.path);
    let (status_code, response) = dispatcher
        .handle_body(event.body.as_deref().unwrap_or_default())
        .await;

    headers.insert("Content-Type".to_string(), "application/json".to_string());
    let body = serde_json::to_string(&response).unwrap_or_else(|e| {
        tracing::error!("❌ Failed to serialize response: {}", e);
        r#"{"success":false,"error":"response serialization failed"}"#.to_string()
    });

    FunctionResponse {
        status_code,
        headers,
        body,
    }
}
