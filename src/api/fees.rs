//! Read-only fee endpoints: the financing-plan catalog and the fee
//! forecast with computed payment-plan options.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::fees::{financing_plans, payment_plans, FeeSchedule, FinancingPlan, PaymentPlanOption};
use crate::AppState;

use super::auth::AuthUser;
use super::error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
pub struct PlansResponse {
    pub plans: Vec<FinancingPlan>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResponse {
    pub schedule: FeeSchedule,
    pub payment_plans: Vec<PaymentPlanOption>,
}

/// GET /plans
pub async fn list_plans(
    State(_state): State<Arc<AppState>>,
    _auth: AuthUser,
) -> Result<Json<PlansResponse>, ApiError> {
    Ok(Json(PlansResponse {
        plans: financing_plans(),
    }))
}

/// GET /fees/forecast
pub async fn fee_forecast(
    State(_state): State<Arc<AppState>>,
    _auth: AuthUser,
) -> Result<Json<ForecastResponse>, ApiError> {
    let schedule = FeeSchedule::sample();
    let plans = payment_plans(schedule.outstanding_amount);
    Ok(Json(ForecastResponse {
        schedule,
        payment_plans: plans,
    }))
}
