//! AI assistant endpoint.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::assistant::ChatTurn;
use crate::AppState;

use super::auth::AuthUser;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::validate_required;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub conversation_history: Vec<ChatTurn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
}

/// POST /ai/chat
pub async fn chat(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_required(&request.message, "Message") {
        errors.add("message", e);
    }
    errors.finish()?;

    let Some(assistant) = state.assistant.as_ref() else {
        return Err(ApiError::service_unavailable(
            "The AI assistant is not configured on this server",
        ));
    };

    let response = assistant
        .chat(&request.conversation_history, &request.message)
        .await?;

    Ok(Json(ChatResponse {
        success: true,
        response,
    }))
}
