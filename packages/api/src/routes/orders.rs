use crate::{
    entity::{order_status_log, payment, review, sea_orm_active_enums::UserRole},
    middleware::jwt::AppUser,
    response::{ApiResult, Page, ok},
    services::{
        orders::{self, CreateOrder, OrderFilter, OrderView},
        reviews,
    },
    state::AppState,
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use stringline::order::OrderStatus;
use stringline_types::utils::page_bounds;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/{order_id}", get(get_order))
        .route("/{order_id}/cancel", post(cancel_order))
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<OrderStatus>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[tracing::instrument(name = "GET /orders", skip(state, user))]
async fn list_orders(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Query(query): Query<ListOrdersQuery>,
) -> ApiResult<Page<OrderView>> {
    let customer = user.require_user(&state).await?;
    let (limit, offset) = page_bounds(query.limit, query.offset);
    let filter = OrderFilter {
        status: query.status,
        overdue: None,
        user_id: Some(customer.id),
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

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub order: OrderView,
    pub payment: Option<payment::Model>,
}

#[tracing::instrument(name = "POST /orders", skip(state, user, body))]
async fn create_order(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(body): Json<CreateOrder>,
) -> ApiResult<CreatedOrder> {
    let customer = user.require_user(&state).await?;
    let (order, payment) = orders::create(&state.db, &customer.id, body).await?;
    ok(CreatedOrder {
        order: OrderView::new(order, &state.config),
        payment,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub order: OrderView,
    pub history: Vec<order_status_log::Model>,
    pub payments: Vec<payment::Model>,
    pub review: Option<review::Model>,
}

#[tracing::instrument(name = "GET /orders/{order_id}", skip(state, user))]
async fn get_order(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(order_id): Path<String>,
) -> ApiResult<OrderDetail> {
    let customer = user.require_user(&state).await?;
    let order = if customer.role == UserRole::Admin {
        orders::find_order(&state.db, &order_id).await?
    } else {
        orders::find_owned(&state.db, &customer.id, &order_id).await?
    };

    let history = orders::status_history(&state.db, &order.id).await?;
    let payments = payment::Entity::find()
        .filter(payment::Column::OrderId.eq(&order.id))
        .order_by_desc(payment::Column::CreatedAt)
        .all(&state.db)
        .await?;
    let review = reviews::find_for_order(&state.db, &order.id).await?;

    ok(OrderDetail {
        order: OrderView::new(order, &state.config),
        history,
        payments,
        review,
    })
}

#[tracing::instrument(name = "POST /orders/{order_id}/cancel", skip(state, user))]
async fn cancel_order(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(order_id): Path<String>,
) -> ApiResult<OrderView> {
    let customer = user.require_user(&state).await?;
    let is_admin = customer.role == UserRole::Admin;
    let cancelled = orders::cancel(&state.db, &customer.id, is_admin, &order_id).await?;
    ok(OrderView::new(cancelled, &state.config))
}
