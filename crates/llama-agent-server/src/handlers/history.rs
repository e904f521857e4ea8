use axum::{extract::State, Json};

use crate::models::chat::HistoryResponse;
use crate::state::AppState;

pub async fn history_handler(State(state): State<AppState>) -> Json<HistoryResponse> {
    Json(HistoryResponse { history: state.agent.history() })
}
