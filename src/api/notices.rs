//! Notice endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::notices::{find_notice, notices, unread_count, Notice};
use crate::AppState;

use super::auth::AuthUser;
use super::error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticesResponse {
    pub notices: Vec<Notice>,
    pub unread_count: usize,
}

/// GET /notices
pub async fn list_notices(
    State(_state): State<Arc<AppState>>,
    _auth: AuthUser,
) -> Result<Json<NoticesResponse>, ApiError> {
    Ok(Json(NoticesResponse {
        notices: notices(),
        unread_count: unread_count(),
    }))
}

/// GET /notices/:id
pub async fn get_notice(
    State(_state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Notice>, ApiError> {
    find_notice(&id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Notice not found"))
}
