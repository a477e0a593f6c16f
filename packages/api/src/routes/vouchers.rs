use crate::{
    entity::{user_voucher, voucher},
    middleware::jwt::AppUser,
    response::{ApiResult, ok},
    services::vouchers,
    state::AppState,
};
use axum::{
    Extension, Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/mine", get(my_vouchers))
        .route("/check", post(check_voucher))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeldVoucher {
    #[serde(flatten)]
    pub held: user_voucher::Model,
    pub voucher: Option<voucher::Model>,
}

#[tracing::instrument(name = "GET /vouchers/mine", skip(state, user))]
async fn my_vouchers(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> ApiResult<Vec<HeldVoucher>> {
    let customer = user.require_user(&state).await?;
    let held = vouchers::list_for_user(&state.db, &customer.id).await?;
    ok(held
        .into_iter()
        .map(|(held, voucher)| HeldVoucher { held, voucher })
        .collect())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckVoucher {
    pub user_voucher_id: String,
    pub price: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherPreview {
    pub user_voucher_id: String,
    pub code: String,
    pub discount: i64,
    pub final_price: i64,
}

/// Previews the discount a held voucher gives on `price`.
#[tracing::instrument(name = "POST /vouchers/check", skip(state, user, body))]
async fn check_voucher(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(body): Json<CheckVoucher>,
) -> ApiResult<VoucherPreview> {
    let customer = user.require_user(&state).await?;
    let applied =
        vouchers::check_applicable(&state.db, &customer.id, &body.user_voucher_id, body.price)
            .await?;
    ok(VoucherPreview {
        user_voucher_id: applied.user_voucher.id,
        code: applied.voucher.code,
        discount: applied.discount,
        final_price: body.price - applied.discount,
    })
}
