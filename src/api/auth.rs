//! Auth endpoints: signup, login, current user.
//!
//! Credentials are forwarded to the identity provider; the portal never
//! sees a password hash. On login the portal mints its own bearer token
//! and the provider's session is discarded. There is no refresh or
//! revocation: one long-lived token is the entire session model.

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::request::Parts,
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::supabase::ProviderUser;
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_email, validate_required};

/// Claims carried by a portal token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id as issued by the identity provider.
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Mints a signed bearer token for a user.
pub fn mint_token(
    user_id: &str,
    email: &str,
    secret: &str,
    ttl_days: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::days(ttl_days)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Decodes and verifies a portal token, including expiry.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// The authenticated caller, extracted from the Authorization header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            ApiError::unauthorized("No token provided. Authentication required.")
        })?;

        let claims = decode_token(token, &state.config.auth.jwt_secret).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ApiError::unauthorized("Token has expired.")
                }
                _ => ApiError::unauthorized("Invalid token."),
            }
        })?;

        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
        })
    }
}

/// A user as the portal reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalUser {
    pub id: String,
    pub email: String,
    pub full_name: String,
}

impl From<ProviderUser> for PortalUser {
    fn from(user: ProviderUser) -> Self {
        let full_name = user.full_name().unwrap_or_default().to_string();
        Self {
            id: user.id,
            email: user.email.unwrap_or_default(),
            full_name,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub user: PortalUser,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: PortalUser,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub user: PortalUser,
}

/// POST /auth/signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<SignupResponse>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_required(&request.full_name, "Full name") {
        errors.add("fullName", e);
    }
    if let Err(e) = validate_email(&request.email) {
        errors.add("email", e);
    }
    if let Err(e) = validate_required(&request.password, "Password") {
        errors.add("password", e);
    }
    errors.finish()?;

    let user = state
        .supabase
        .sign_up(&request.full_name, &request.email, &request.password)
        .await?;

    tracing::info!(user_id = %user.id, "New parent signed up");

    Ok(Json(SignupResponse { user: user.into() }))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_required(&request.email, "Email") {
        errors.add("email", e);
    }
    if let Err(e) = validate_required(&request.password, "Password") {
        errors.add("password", e);
    }
    errors.finish()?;

    // Bad credentials and provider outages both read as a failed login.
    let user = state
        .supabase
        .sign_in_with_password(&request.email, &request.password)
        .await
        .map_err(|e| {
            tracing::warn!(email = %request.email, "Login rejected: {}", e);
            ApiError::unauthorized(match e {
                crate::supabase::SupabaseError::Provider { message, .. } => message,
                _ => "Invalid email or password.".to_string(),
            })
        })?;

    let email = user.email.clone().unwrap_or_else(|| request.email.clone());
    let token = mint_token(
        &user.id,
        &email,
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_days,
    )
    .map_err(|e| {
        tracing::error!("Failed to mint token: {}", e);
        ApiError::internal("Login failed")
    })?;

    Ok(Json(LoginResponse {
        user: user.into(),
        token,
    }))
}

/// GET /auth/me
pub async fn current_user(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<CurrentUserResponse>, ApiError> {
    let user = state
        .supabase
        .get_user_by_id(&auth.id)
        .await
        .map_err(|e| match e {
            crate::supabase::SupabaseError::RowNotFound => ApiError::not_found("User not found."),
            other => other.into(),
        })?;

    Ok(Json(CurrentUserResponse { user: user.into() }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn minted_token_round_trips_identity() {
        let token = mint_token("user-1", "parent@example.com", SECRET, 7).unwrap();
        let claims = decode_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "parent@example.com");
    }

    #[test]
    fn minted_token_expires_in_seven_days() {
        let token = mint_token("user-1", "parent@example.com", SECRET, 7).unwrap();
        let claims = decode_token(&token, SECRET).unwrap();
        let lifetime = claims.exp - claims.iat;
        assert_eq!(lifetime, 7 * 24 * 60 * 60);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = mint_token("user-1", "parent@example.com", SECRET, 7).unwrap();
        assert!(decode_token(&token, "other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        let token = mint_token("user-1", "parent@example.com", SECRET, -1).unwrap();
        let err = decode_token(&token, SECRET).unwrap_err();
        assert!(matches!(
            err.kind(),
            jsonwebtoken::errors::ErrorKind::ExpiredSignature
        ));
    }

    #[test]
    fn portal_user_falls_back_to_empty_strings() {
        let user = ProviderUser {
            id: "user-1".to_string(),
            email: None,
            user_metadata: serde_json::json!({}),
        };
        let portal: PortalUser = user.into();
        assert_eq!(portal.email, "");
        assert_eq!(portal.full_name, "");
    }
}
