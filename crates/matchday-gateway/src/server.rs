use crate::features::observability::controller::ObservabilityController;
use crate::tools::ToolGateway;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    gateway: Arc<ToolGateway>,
    observability: Arc<ObservabilityController>,
}

/// HTTP surface over the Tool Gateway. Tool calls always answer 200 with
/// either the success payload or the structured error object.
pub fn router(gateway: Arc<ToolGateway>, observability: Arc<ObservabilityController>) -> Router {
    Router::new()
        .route("/v1/tools/:tool", post(call_tool))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(AppState {
            gateway,
            observability,
        })
}

async fn call_tool(
    State(state): State<AppState>,
    Path(tool): Path<String>,
    args: Option<Json<Value>>,
) -> Json<Value> {
    let args = args.map(|Json(value)| value).unwrap_or_else(|| json!({}));
    Json(state.gateway.dispatch(&tool, args).await)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn metrics(State(state): State<AppState>) -> (StatusCode, String) {
    match state.observability.render_metrics() {
        Ok(body) => (StatusCode::OK, body),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err),
    }
}
