use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    read_only: bool,
}

async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        read_only: state.is_read_only(),
    })
}

/// Liveness check, served outside the kernel route table.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
