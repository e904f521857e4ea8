use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::agent::{AgentError, ErrorKind, ReplyRoute};
use crate::models::chat::{ChatRequest, ChatResponse};
use crate::state::AppState;
use crate::utils::error::ApiError;

const NO_MESSAGE: &str = "No message provided";

/// Structured body for `POST /api/chat`
#[derive(Debug, Serialize)]
pub struct AgentReplyResponse {
    pub ok: bool,
    pub route: ReplyRoute,
    pub cached: bool,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

fn require_message(payload: Result<Json<ChatRequest>, JsonRejection>) -> Result<String, ApiError> {
    let Json(request) = payload.map_err(|e| {
        debug!("Rejected chat body: {}", e);
        ApiError::BadRequest(NO_MESSAGE.to_string())
    })?;

    match request.message {
        Some(message) if !message.is_empty() => Ok(message),
        _ => Err(ApiError::BadRequest(NO_MESSAGE.to_string())),
    }
}

fn error_route(err: &AgentError) -> ReplyRoute {
    match err {
        AgentError::MissingSymbol | AgentError::Quote(_) => ReplyRoute::StockQuote,
        AgentError::WebSearch(_) => ReplyRoute::WebBrowse,
        AgentError::Completion(_) => ReplyRoute::Conversation,
    }
}

/// `POST /chat`: legacy contract, failures are returned as reply text
pub async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = require_message(payload)?;
    info!("Chat request: message_len={}", message.len());

    let response = state.agent.handle_message(&message).await;
    Ok(Json(ChatResponse { response }))
}

/// `POST /api/chat`: same routing with the outcome spelled out
pub async fn agent_chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<AgentReplyResponse>, ApiError> {
    let message = require_message(payload)?;
    info!("Structured chat request: message_len={}", message.len());

    let body = match state.agent.respond(&message).await {
        Ok(reply) => AgentReplyResponse {
            ok: true,
            route: reply.route,
            cached: reply.cached,
            response: reply.text,
            error_kind: None,
        },
        Err(err) => {
            debug!("Agent error ({:?}): {}", err.kind(), err.detail());
            AgentReplyResponse {
                ok: false,
                route: error_route(&err),
                cached: false,
                error_kind: Some(err.kind()),
                response: err.to_string(),
            }
        }
    };

    Ok(Json(body))
}
