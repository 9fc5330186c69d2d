//! Profile endpoints: the merged two-table read, the atomic upsert, and
//! password changes.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::profile::{
    combine_reads, merge_profile, FeeResponsibilityRow, ParentProfile, ParentRow, ParentUpsert,
    ProfileUpdate,
};
use crate::supabase::SupabaseError;
use crate::AppState;

use super::auth::AuthUser;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_email, validate_required, validate_uuid};

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateProfileResponse {
    pub message: String,
    pub data: ParentRow,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChangePasswordResponse {
    pub message: String,
}

/// GET /profile/me
///
/// Reads both per-user rows sequentially, then the provider record, and
/// merges them. If both row reads fail the first failure wins; a user
/// with no rows at all is a 404, never an empty profile.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<ParentProfile>, ApiError> {
    if let Err(e) = validate_uuid(&auth.id, "user id") {
        return Err(ApiError::unauthorized(e));
    }

    let parent_read = state
        .supabase
        .fetch_row::<ParentRow>("parents", &auth.id)
        .await;
    let fee_read = state
        .supabase
        .fetch_row::<FeeResponsibilityRow>("fee_responsibility", &auth.id)
        .await;

    let (parent, fee) = combine_reads(parent_read, fee_read).map_err(|e| {
        tracing::warn!(user_id = %auth.id, "Both profile reads failed: {}", e);
        e
    })?;

    let provider_user = state.supabase.get_user_by_id(&auth.id).await?;

    Ok(Json(merge_profile(
        &auth.id,
        fee.as_ref(),
        parent.as_ref(),
        Some(&provider_user),
    )))
}

/// PUT /profile/me
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UpdateProfileResponse>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_required(&update.full_name, "Full name") {
        errors.add("fullName", e);
    }
    if let Err(e) = validate_email(&update.email) {
        errors.add("email", e);
    }
    if let Err(e) = validate_required(&update.phone, "Phone") {
        errors.add("phone", e);
    }
    errors.finish()?;

    let payload = ParentUpsert::from_update(&auth.id, &update);
    let row: ParentRow = state.supabase.upsert_row("parents", &payload).await?;

    Ok(Json(UpdateProfileResponse {
        message: "Profile updated successfully".to_string(),
        data: row,
    }))
}

/// POST /profile/change-password
///
/// The current password is checked with a fresh password grant before the
/// admin API sets the new one.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<ChangePasswordResponse>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_required(&request.current_password, "Current password") {
        errors.add("currentPassword", e);
    }
    if let Err(e) = validate_required(&request.new_password, "New password") {
        errors.add("newPassword", e);
    }
    errors.finish()?;

    state
        .supabase
        .sign_in_with_password(&auth.email, &request.current_password)
        .await
        .map_err(|e| match e {
            SupabaseError::Provider { .. } => {
                ApiError::unauthorized("Current password is incorrect.")
            }
            other => other.into(),
        })?;

    state
        .supabase
        .update_user_password(&auth.id, &request.new_password)
        .await?;

    tracing::info!(user_id = %auth.id, "Password changed");

    Ok(Json(ChangePasswordResponse {
        message: "Password changed successfully".to_string(),
    }))
}
