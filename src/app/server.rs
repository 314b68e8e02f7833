//! axum HTTP surface for the dispatcher.

use crate::core::dispatch::Dispatcher;
use crate::domain::ports::SheetStore;
use crate::utils::error::Result;
use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const API_PATH: &str = "/api/sheets";
/// 前端原本呼叫的 Netlify function 路徑
pub const LEGACY_FUNCTION_PATH: &str = "/.netlify/functions/google-sheets";

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([header::CONTENT_TYPE])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
}

pub fn router<S: SheetStore + 'static>(dispatcher: Dispatcher<S>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(API_PATH, post(handle_action::<S>).options(preflight))
        .route(
            LEGACY_FUNCTION_PATH,
            post(handle_action::<S>).options(preflight),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(dispatcher)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn handle_action<S: SheetStore + 'static>(
    State(dispatcher): State<Dispatcher<S>>,
    body: String,
) -> impl IntoResponse {
    let (status, response) = dispatcher.handle_body(&body).await;
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response))
}

pub async fn serve<S: SheetStore + 'static>(dispatcher: Dispatcher<S>, bind_address: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    tracing::info!("🚀 refi-desk listening on {}", listener.local_addr()?);

    axum::serve(listener, router(dispatcher)).await?;
    Ok(())
}
