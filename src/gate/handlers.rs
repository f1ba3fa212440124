//! HTTP request handlers for the gateway

use crate::chat::now_iso8601;
use crate::{ChatMessage, ChatReply, ChatService, Error, MESSAGES_REQUIRED};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info_span, warn, Instrument};

/// Error response: status plus a JSON body carrying only a message
pub type ApiError = (StatusCode, Json<Value>);

/// Gateway state shared across handlers
#[derive(Clone)]
pub struct GatewayState {
    pub service: ChatService,
    pub service_name: Arc<str>,
}

impl GatewayState {
    pub fn new(service: ChatService, service_name: impl Into<Arc<str>>) -> Self {
        GatewayState {
            service,
            service_name: service_name.into(),
        }
    }
}

fn client_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

/// Handle `POST /api/RikoChat`
pub async fn riko_chat_handler(
    State(state): State<GatewayState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected chat request body: {}", rejection.body_text());
        client_error(rejection.status(), rejection.body_text())
    })?;

    let messages = parse_messages(&request)?;

    let span = info_span!("chat", request_id = %uuid::Uuid::new_v4());
    match state.service.reply(&messages).instrument(span).await {
        Ok(reply) => Ok(Json(reply)),
        Err(Error::InvalidRequest(message)) => Err(client_error(StatusCode::BAD_REQUEST, message)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "error": e.to_string() })),
        )),
    }
}

/// Extract the conversation; a missing or null `messages` counts as empty
fn parse_messages(request: &Value) -> Result<Vec<ChatMessage>, ApiError> {
    match request.get("messages") {
        None | Some(Value::Null) => Err(client_error(StatusCode::BAD_REQUEST, MESSAGES_REQUIRED)),
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
            warn!("Failed to parse messages: {}", e);
            client_error(StatusCode::BAD_REQUEST, format!("Invalid messages: {}", e))
        }),
    }
}

/// Handle `GET /api/health`
pub async fn health_handler(State(state): State<GatewayState>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "service": state.service_name.as_ref(),
        "timestamp": now_iso8601()
    }))
}
