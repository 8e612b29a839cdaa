use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, info};

use crate::agent::ChatOutcome;
use crate::web::state::AppState;

pub const INVALID_QUERY_MESSAGE: &str = "could not generate a valid query; rephrase or add context";
pub const UNSAFE_QUERY_MESSAGE: &str =
    "generated statement contains disallowed operations; only SELECT/INSERT/UPDATE/DELETE permitted";
pub const EXECUTED_MESSAGE: &str = "statement executed successfully";

#[derive(Debug, Deserialize, Clone)]
pub struct ChatRequest {
    pub message: String,
}

/// Body of every `200` answer from `/api/chat`.
#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ChatResponse {
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<JsonValue>>,
    },
    Message {
        message: String,
    },
    Error {
        error: String,
    },
}

impl From<ChatOutcome> for ChatResponse {
    fn from(outcome: ChatOutcome) -> Self {
        let error = |text: String| ChatResponse::Error { error: text };
        match outcome {
            ChatOutcome::Rows { columns, rows } => ChatResponse::Rows { columns, rows },
            ChatOutcome::Executed { affected } => {
                debug!("Statement affected {} rows", affected);
                ChatResponse::Message {
                    message: EXECUTED_MESSAGE.to_string(),
                }
            }
            ChatOutcome::InvalidQuery => error(INVALID_QUERY_MESSAGE.to_string()),
            ChatOutcome::UnsafeQuery => error(UNSAFE_QUERY_MESSAGE.to_string()),
            ChatOutcome::DatabaseFailed(detail) => error(format!("database error: {}", detail)),
            ChatOutcome::GenerationFailed(detail) | ChatOutcome::Unexpected(detail) => {
                error(format!("unexpected error: {}", detail))
            }
        }
    }
}

pub async fn chat(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Json<ChatResponse> {
    info!("Received chat request: {}", payload.message);

    let response = ChatResponse::from(app_state.agent.process(&payload.message).await);

    match &response {
        ChatResponse::Rows { rows, .. } => info!("Sending {} rows back", rows.len()),
        ChatResponse::Message { message } => info!("Sending response back: {}", message),
        ChatResponse::Error { error } => info!("Sending error back: {}", error),
    }
    Json(response)
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime_seconds: i64,
    pub model: String,
}

pub async fn system_status(State(state): State<Arc<AppState>>) -> Json<SystemStatus> {
    let now = chrono::Utc::now();
    let uptime = now.signed_duration_since(state.startup_time).num_seconds();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        model: state.agent.model().to_string(),
    })
}
