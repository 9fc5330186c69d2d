mod assistant;
pub mod auth;
mod error;
mod fees;
mod notices;
mod profile;
mod validation;

pub use assistant::ChatResponse;
pub use error::{ApiError, ErrorCode, ErrorResponse};
pub use fees::{ForecastResponse, PlansResponse};
pub use notices::NoticesResponse;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/me", get(auth::current_user));

    // Every handler below requires a bearer token via the AuthUser
    // extractor.
    let profile_routes = Router::new()
        .route("/me", get(profile::get_profile))
        .route("/me", put(profile::update_profile))
        .route("/change-password", post(profile::change_password));

    Router::new()
        .route("/health", get(health_check))
        .nest("/auth", auth_routes)
        .nest("/profile", profile_routes)
        .route("/plans", get(fees::list_plans))
        .route("/fees/forecast", get(fees::fee_forecast))
        .route("/notices", get(notices::list_notices))
        .route("/notices/:id", get(notices::get_notice))
        .route("/ai/chat", post(assistant::chat))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}
