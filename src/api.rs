// src/api.rs
use std::sync::Arc;

use shuttle_axum::axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::orchestrator::CycleEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<CycleEngine>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/cycle", post(run_cycle))
        .route("/alerts/pending", get(pending_alerts))
        .route("/alerts/{id}/ack", post(acknowledge_alert))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct CycleParams {
    channel: Option<String>,
}

async fn run_cycle(
    State(state): State<AppState>,
    Query(params): Query<CycleParams>,
) -> impl IntoResponse {
    let Some(channel) = params.channel else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "Missing channel parameter" })),
        );
    };
    let report = state.engine.run_cycle(&channel).await;
    (
        StatusCode::OK,
        Json(serde_json::to_value(report).unwrap_or_default()),
    )
}

async fn acknowledge_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if state.engine.tracker().acknowledge(&id) {
        (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "acknowledged", "alert_id": id })),
        )
    } else {
        // Unknown id is "not found", not a failure.
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "status": "not_found", "alert_id": id })),
        )
    }
}

async fn pending_alerts(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.engine.tracker().pending())
}
