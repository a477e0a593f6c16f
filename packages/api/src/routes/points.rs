use crate::{
    entity::{points_log, sea_orm_active_enums::MembershipTier, user_voucher},
    middleware::jwt::AppUser,
    response::{ApiResult, ok},
    routes::PaginationParams,
    services::{points, vouchers},
    state::AppState,
};
use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use stringline::loyalty::PointsStats;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_points))
        .route("/history", get(get_history))
        .route("/redeem", post(redeem))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsOverview {
    pub balance: i64,
    pub tier: MembershipTier,
    pub multiplier: f64,
    pub total_spent: i64,
    pub stats: PointsStats,
}

#[tracing::instrument(name = "GET /points", skip(state, user))]
async fn get_points(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> ApiResult<PointsOverview> {
    let customer = user.require_user(&state).await?;
    let mut stats = points::stats(&state.db, Some(&customer.id)).await?;
    stats.balance = customer.points;
    ok(PointsOverview {
        balance: customer.points,
        tier: customer.membership_tier,
        multiplier: customer.membership_tier.multiplier(),
        total_spent: customer.total_spent,
        stats,
    })
}

#[tracing::instrument(name = "GET /points/history", skip(state, user))]
async fn get_history(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Query(query): Query<PaginationParams>,
) -> ApiResult<Vec<points_log::Model>> {
    let customer = user.require_user(&state).await?;
    let (limit, offset) = query.bounds();
    ok(points::history(&state.db, &customer.id, limit, offset).await?)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemBody {
    pub voucher_id: String,
}

#[tracing::instrument(name = "POST /points/redeem", skip(state, user, body))]
async fn redeem(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(body): Json<RedeemBody>,
) -> ApiResult<user_voucher::Model> {
    let customer = user.require_user(&state).await?;
    let txn = state.db.begin().await?;
    let granted = vouchers::redeem_with_points(&txn, &customer.id, &body.voucher_id).await?;
    txn.commit().await?;
    ok(granted)
}
