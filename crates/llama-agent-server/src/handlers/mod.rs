pub mod chat;
pub mod health;
pub mod history;
pub mod index;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.settings.server.body_limit_bytes;

    // Public routes
    let public_routes = Router::new()
        .route("/", get(index::index_handler))
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Agent routes, with and without the trailing slash
    let agent_routes = Router::new()
        .route("/chat", post(chat::chat_handler))
        .route("/chat/", post(chat::chat_handler))
        .route("/api/chat", post(chat::agent_chat_handler))
        .route("/upload", post(upload::upload_handler))
        .route("/upload/", post(upload::upload_handler))
        .route("/history", get(history::history_handler))
        .route("/history/", get(history::history_handler));

    Router::new()
        .merge(public_routes)
        .merge(agent_routes)
        .with_state(state)
        // CORS
        .layer(CorsLayer::permissive())
        // Tracing
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(DefaultBodyLimit::max(body_limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::providers::{MockChatCompletion, MockQuoteProvider, QuoteSnapshot};
    use crate::agent::{CompletionError, ConversationAgent, QuoteError};
    use crate::config::Settings;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(agent: ConversationAgent) -> Router {
        build_router(AppState::new(agent, Settings::default()))
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn multipart_request(file_name: &str, content: &str) -> Request<Body> {
        let boundary = "X-LLAMA-AGENT-BOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: text/plain\r\n\r\n{c}\r\n--{b}--\r\n",
            b = boundary,
            f = file_name,
            c = content
        );
        Request::builder()
            .method("POST")
            .uri("/upload/")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn replying_llm(answer: &'static str) -> Arc<MockChatCompletion> {
        let mut llm = MockChatCompletion::new();
        llm.expect_complete().returning(move |_| Ok(answer.to_string()));
        Arc::new(llm)
    }

    #[tokio::test]
    async fn test_chat_returns_reply_text() {
        let agent = ConversationAgent::builder(replying_llm("hi there"))
            .system_prompt("sys")
            .build();
        let app = app(agent);

        let response = app
            .clone()
            .oneshot(json_request("/chat", json!({"message": "hello"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"response": "hi there"}));

        let response = app
            .oneshot(Request::builder().uri("/history/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["history"].as_array().map(Vec::len), Some(3));
        assert_eq!(body["history"][2], json!({"role": "assistant", "content": "hi there"}));
    }

    #[tokio::test]
    async fn test_chat_without_message_is_rejected() {
        let app = app(ConversationAgent::builder(Arc::new(MockChatCompletion::new())).build());

        for body in [json!({}), json!({"message": ""}), json!({"message": null})] {
            let response = app.clone().oneshot(json_request("/chat/", body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(response).await["error"], "No message provided");
        }

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/chat")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_whitespace_message_is_forwarded() {
        let app = app(ConversationAgent::builder(replying_llm("anything else?")).build());

        let response = app
            .oneshot(json_request("/chat", json!({"message": "   "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["response"], "anything else?");
    }

    #[tokio::test]
    async fn test_structured_chat_reports_route_and_cache() {
        let mut quotes = MockQuoteProvider::new();
        quotes.expect_latest_quote().times(1).returning(|symbol| {
            Ok(QuoteSnapshot {
                symbol: symbol.to_string(),
                timestamp: "2024-01-01 09:30:00".to_string(),
                open: "10".to_string(),
                high: "11".to_string(),
                low: "9".to_string(),
                close: "10.5".to_string(),
                volume: "1000".to_string(),
            })
        });
        let agent = ConversationAgent::builder(Arc::new(MockChatCompletion::new()))
            .quotes(Arc::new(quotes))
            .build();
        let app = app(agent);

        let first = body_json(
            app.clone()
                .oneshot(json_request("/api/chat", json!({"message": "stock AAPL"})))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(first["ok"], true);
        assert_eq!(first["route"], "stock_quote");
        assert_eq!(first["cached"], false);
        assert!(first.get("error_kind").is_none());

        let second = body_json(
            app.oneshot(json_request("/api/chat", json!({"message": "AAPL price"})))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(second["cached"], true);
        assert_eq!(second["response"], first["response"]);
    }

    #[tokio::test]
    async fn test_structured_chat_error_kind() {
        let mut quotes = MockQuoteProvider::new();
        quotes.expect_latest_quote().returning(|_| Err(QuoteError::RateLimited));
        let agent = ConversationAgent::builder(Arc::new(MockChatCompletion::new()))
            .quotes(Arc::new(quotes))
            .build();

        let body = body_json(
            app(agent)
                .oneshot(json_request("/api/chat", json!({"message": "stock MSFT"})))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["error_kind"], "rate_limited");
        assert_eq!(
            body["response"],
            "API request limit reached. Please wait a while before trying again."
        );
    }

    #[tokio::test]
    async fn test_upload_summarizes_text_file() {
        let app = app(ConversationAgent::builder(replying_llm("A grocery list.")).build());

        let response = app.oneshot(multipart_request("list.txt", "eggs\nmilk")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"message": "File processed successfully", "response": "A grocery list."})
        );
    }

    #[tokio::test]
    async fn test_upload_rejects_other_extensions() {
        let app = app(ConversationAgent::builder(Arc::new(MockChatCompletion::new())).build());

        let response = app.oneshot(multipart_request("report.pdf", "%PDF")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["kind"], "unsupported_media");
    }

    #[tokio::test]
    async fn test_upload_model_failure_is_unavailable() {
        let mut llm = MockChatCompletion::new();
        llm.expect_complete()
            .returning(|_| Err(CompletionError::Transport("refused".to_string())));
        let app = app(ConversationAgent::builder(Arc::new(llm)).build());

        let response = app.oneshot(multipart_request("notes.txt", "hello")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_index_and_health() {
        let app = app(ConversationAgent::builder(Arc::new(MockChatCompletion::new())).build());

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["status"], "ready");
        assert_eq!(body["routes"], json!([]));
    }

    #[tokio::test]
    async fn test_readiness_lists_routes_in_snake_case() {
        let agent = ConversationAgent::builder(Arc::new(MockChatCompletion::new()))
            .quotes(Arc::new(MockQuoteProvider::new()))
            .build();

        let response = app(agent)
            .oneshot(Request::builder().uri("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await["routes"], json!(["stock_quote"]));
    }
}
