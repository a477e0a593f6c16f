//! Manual payment verification queue

use crate::{
    entity::{order, payment},
    middleware::jwt::AppUser,
    response::{ApiResult, Page, ok},
    routes::PaginationParams,
    services::payments,
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedPayment {
    #[serde(flatten)]
    pub payment: payment::Model,
    pub order: Option<order::Model>,
}

/// GET /admin/payments/pending
#[tracing::instrument(name = "GET /admin/payments/pending", skip(state, user))]
pub async fn pending_payments(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Query(query): Query<PaginationParams>,
) -> ApiResult<Page<QueuedPayment>> {
    user.require_admin(&state).await?;
    let (limit, offset) = query.bounds();
    let (items, total) = payments::pending_queue(&state.db, limit, offset).await?;
    ok(Page {
        items: items
            .into_iter()
            .map(|(payment, order)| QueuedPayment { payment, order })
            .collect(),
        total,
        limit,
        offset,
    })
}

/// POST /admin/payments/{payment_id}/verify
#[tracing::instrument(name = "POST /admin/payments/{payment_id}/verify", skip(state, user))]
pub async fn verify_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(payment_id): Path<String>,
) -> ApiResult<payment::Model> {
    let admin_id = user.require_admin(&state).await?;
    ok(payments::verify(&state.db, &admin_id, &payment_id).await?)
}

#[derive(Debug, Deserialize)]
pub struct RejectBody {
    pub reason: String,
}

/// POST /admin/payments/{payment_id}/reject
#[tracing::instrument(name = "POST /admin/payments/{payment_id}/reject", skip(state, user, body))]
pub async fn reject_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(payment_id): Path<String>,
    Json(body): Json<RejectBody>,
) -> ApiResult<payment::Model> {
    let admin_id = user.require_admin(&state).await?;
    ok(payments::reject(&state.db, &admin_id, &payment_id, &body.reason).await?)
}
