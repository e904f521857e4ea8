use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::agent::Route;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    status: String,
    routes: Vec<Route>,
    retrieval: bool,
}

pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Reports which intent routes the agent was built with
pub async fn readiness_check(State(state): State<AppState>) -> Json<ReadinessResponse> {
    Json(ReadinessResponse {
        status: "ready".to_string(),
        routes: state.agent.router().routes().to_vec(),
        retrieval: state.settings.retrieval.enabled,
    })
}
