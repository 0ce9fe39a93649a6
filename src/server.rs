//! HTTP surface: accepts Anthropic Messages requests and answers them through
//! the executor dispatch layer.

use crate::dispatch::SelectorHandle;
use crate::error::BridgeError;
use crate::logging::SharedLogger;
use crate::transport::{self, forwarded_headers, Payload, RequestTransport};
use crate::translate::anthropic_types::ErrorResponse;
use crate::translate::openai_types::ChatErrorResponse;
use crate::translate::response::secondary_error_to_primary;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub dispatch: Arc<dyn RequestTransport>,
    pub selector: SelectorHandle,
    pub logger: SharedLogger,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/v1/messages", post(handle_messages))
        .route("/health", get(handle_health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The fields of an incoming request worth logging. The body itself is
/// forwarded as received.
#[derive(Deserialize)]
struct RequestSummary {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    stream: Option<bool>,
}

async fn handle_messages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let summary: RequestSummary = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            state
                .logger
                .error("server", format!("Failed to parse request: {e}"));
            let err = ErrorResponse::invalid_request(format!("Invalid request body: {e}"));
            return (StatusCode::BAD_REQUEST, Json(err)).into_response();
        }
    };

    state.logger.info(
        "server",
        format!(
            "Request: model={} stream={}",
            summary.model.as_deref().unwrap_or("?"),
            summary.stream.unwrap_or(false)
        ),
    );

    let request = Payload::new(body).with_headers(forwarded_headers(&headers));

    match transport::call(state.dispatch.as_ref(), request).await {
        Ok(reply) if reply.is_empty() => {
            let err = ErrorResponse::api_error("Backend returned an empty response");
            (StatusCode::BAD_GATEWAY, Json(err)).into_response()
        }
        Ok(reply) => raw_response(reply),
        Err(BridgeError::Status { status, body }) => {
            state
                .logger
                .warn("server", format!("Backend error status={status}"));
            let code = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            (code, Json(error_body_to_primary(status, &body))).into_response()
        }
        Err(e @ BridgeError::Translation { .. }) => {
            let err = ErrorResponse::invalid_request(e.to_string());
            (StatusCode::BAD_REQUEST, Json(err)).into_response()
        }
        Err(e) => {
            state.logger.error("server", format!("Dispatch error: {e}"));
            let err = ErrorResponse::api_error(format!("Bridge error: {e}"));
            (StatusCode::BAD_GATEWAY, Json(err)).into_response()
        }
    }
}

/// Hand a backend reply to the client unchanged, JSON or event stream.
fn raw_response(reply: Payload) -> Response {
    let content_type = reply
        .content_type()
        .unwrap_or("application/json")
        .to_string();

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type.as_str());
    if content_type.contains("text/event-stream") {
        builder = builder.header(CACHE_CONTROL, "no-cache");
    }

    builder
        .body(Body::from(reply.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Backend error bodies may already be Anthropic-shaped (passthrough) or
/// OpenAI-shaped (translated backend).
fn error_body_to_primary(status: u16, body: &str) -> ErrorResponse {
    if let Ok(err) = serde_json::from_str::<ErrorResponse>(body) {
        return err;
    }
    if let Ok(err) = serde_json::from_str::<ChatErrorResponse>(body) {
        return secondary_error_to_primary(&err);
    }
    ErrorResponse::api_error(format!("Backend returned status {status}: {body}"))
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.selector.snapshot().to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_shapes() {
        let anthropic = r#"{"type":"error","error":{"type":"overloaded_error","message":"busy"}}"#;
        assert_eq!(error_body_to_primary(529, anthropic).error.error_type, "overloaded_error");

        let openai = r#"{"error":{"message":"bad key","type":"invalid_request_error"}}"#;
        let mapped = error_body_to_primary(401, openai);
        assert_eq!(mapped.error.error_type, "invalid_request_error");
        assert_eq!(mapped.error.message, "bad key");

        let plain = error_body_to_primary(500, "oops");
        assert_eq!(plain.error.error_type, "api_error");
        assert!(plain.error.message.contains("oops"));
    }

    #[test]
    fn test_raw_response_keeps_body_and_stream_type() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "text/event-stream".parse().unwrap());
        let resp = raw_response(Payload::new("event: ping\n\n").with_headers(headers));
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/event-stream");
        assert_eq!(resp.headers()[CACHE_CONTROL], "no-cache");

        let resp = raw_response(Payload::new(r#"{"b":1,"a":2}"#));
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
    }
}
