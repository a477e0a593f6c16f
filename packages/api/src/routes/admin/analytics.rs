//! Back-office reporting

use crate::{
    middleware::jwt::AppUser,
    response::{ApiResult, ok},
    services::analytics::{self, Dashboard},
    state::AppState,
};
use axum::{
    Extension,
    extract::{Query, State},
};
use serde::Deserialize;
use stringline::analytics::DailyRevenue;

/// GET /admin/analytics/dashboard
#[tracing::instrument(name = "GET /admin/analytics/dashboard", skip(state, user))]
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> ApiResult<Dashboard> {
    user.require_admin(&state).await?;
    ok(analytics::dashboard(&state.db).await?)
}

#[derive(Debug, Deserialize)]
pub struct RevenueQuery {
    pub days: Option<i64>,
}

/// GET /admin/analytics/revenue?days=30
#[tracing::instrument(name = "GET /admin/analytics/revenue", skip(state, user))]
pub async fn revenue(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Query(query): Query<RevenueQuery>,
) -> ApiResult<Vec<DailyRevenue>> {
    user.require_admin(&state).await?;
    ok(analytics::revenue_report(&state.db, query.days).await?)
}
