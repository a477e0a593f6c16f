use crate::{
    entity::user,
    middleware::jwt::AppUser,
    response::{ApiResult, ok},
    services::referrals::{self, ReferralSummary},
    state::AppState,
};
use axum::{
    Extension, Json, Router,
    extract::State,
    routing::{get, post},
};
use sea_orm::TransactionTrait;
use serde::Deserialize;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_referrals))
        .route("/apply", post(apply_referral))
}

#[tracing::instrument(name = "GET /referrals", skip(state, user))]
async fn get_referrals(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> ApiResult<ReferralSummary> {
    let customer = user.require_user(&state).await?;
    ok(referrals::summary(&state.db, &customer).await?)
}

#[derive(Debug, Deserialize)]
pub struct ApplyReferral {
    pub code: String,
}

#[tracing::instrument(name = "POST /referrals/apply", skip(state, user, body))]
async fn apply_referral(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(body): Json<ApplyReferral>,
) -> ApiResult<user::Model> {
    let customer = user.require_user(&state).await?;
    let txn = state.db.begin().await?;
    let updated = referrals::apply_code(&txn, customer, &body.code).await?;
    txn.commit().await?;
    ok(updated)
}
