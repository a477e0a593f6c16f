//! Workshop order management

use crate::{
    middleware::jwt::AppUser,
    response::{ApiResult, Page, ok},
    services::orders::{self, OrderFilter, OrderView, SweepReport},
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDateTime;
use serde::Deserialize;
use stringline::order::OrderStatus;
use stringline_types::utils::page_bounds;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderQuery {
    pub status: Option<OrderStatus>,
    pub overdue: Option<bool>,
    pub user_id: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// GET /admin/orders
#[tracing::instrument(name = "GET /admin/orders", skip(state, user))]
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Query(query): Query<AdminOrderQuery>,
) -> ApiResult<Page<OrderView>> {
    user.require_admin(&state).await?;
    let (limit, offset) = page_bounds(query.limit, query.offset);
    let filter = OrderFilter {
        status: query.status,
        overdue: query.overdue,
        user_id: query.user_id,
    };
    let (items, total) = orders::list(&state.db, &filter, limit, offset).await?;
    ok(Page {
        items: items
            .into_iter()
            .map(|o| OrderView::new(o, &state.config))
            .collect(),
        total,
        limit,
        offset,
    })
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
    pub note: Option<String>,
}

/// PATCH /admin/orders/{order_id}/status
#[tracing::instrument(name = "PATCH /admin/orders/{order_id}/status", skip(state, user, body))]
pub async fn update_status(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(order_id): Path<String>,
    Json(body): Json<StatusUpdate>,
) -> ApiResult<OrderView> {
    let admin_id = user.require_admin(&state).await?;
    let updated =
        orders::update_status(&state.db, &admin_id, &order_id, body.status, body.note).await?;
    ok(OrderView::new(updated, &state.config))
}

#[derive(Debug, Deserialize)]
pub struct EtaUpdate {
    /// `null` clears the override
    pub eta: Option<NaiveDateTime>,
}

/// PATCH /admin/orders/{order_id}/eta
#[tracing::instrument(name = "PATCH /admin/orders/{order_id}/eta", skip(state, user, body))]
pub async fn set_eta(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(order_id): Path<String>,
    Json(body): Json<EtaUpdate>,
) -> ApiResult<OrderView> {
    user.require_admin(&state).await?;
    let updated = orders::set_eta(&state.db, &order_id, body.eta).await?;
    ok(OrderView::new(updated, &state.config))
}

/// POST /admin/automation/run
#[tracing::instrument(name = "POST /admin/automation/run", skip(state, user))]
pub async fn run_automation(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> ApiResult<SweepReport> {
    user.require_admin(&state).await?;
    ok(orders::sweep_overdue(&state.db, state.config.overdue_hours).await?)
}
