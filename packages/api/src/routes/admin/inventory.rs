//! String inventory

use crate::{
    entity::{stock_log, string_item},
    error::ApiError,
    middleware::jwt::AppUser,
    response::{ApiResult, ok},
    routes::PaginationParams,
    services::{
        analytics,
        inventory::{self, StockChange},
    },
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use serde::Deserialize;
use stringline_types::{create_id, now};

/// GET /admin/inventory
#[tracing::instrument(name = "GET /admin/inventory", skip(state, user))]
pub async fn list_items(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> ApiResult<Vec<string_item::Model>> {
    user.require_admin(&state).await?;
    let items = string_item::Entity::find()
        .order_by_asc(string_item::Column::Brand)
        .order_by_asc(string_item::Column::Model)
        .all(&state.db)
        .await?;
    ok(items)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItem {
    pub brand: String,
    pub model: String,
    pub gauge: Option<i32>,
    pub color: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: i32,
    pub low_stock_threshold: Option<i32>,
}

/// POST /admin/inventory
#[tracing::instrument(name = "POST /admin/inventory", skip(state, user, body))]
pub async fn create_item(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(body): Json<CreateItem>,
) -> ApiResult<string_item::Model> {
    let admin_id = user.require_admin(&state).await?;
    if body.brand.trim().is_empty() || body.model.trim().is_empty() {
        return Err(ApiError::bad_request("Brand and model are required"));
    }
    if body.price_cents < 0 || body.stock < 0 {
        return Err(ApiError::bad_request("Price and stock cannot be negative"));
    }

    let txn = state.db.begin().await?;
    let now = now();
    let created = string_item::ActiveModel {
        id: Set(create_id()),
        brand: Set(body.brand.trim().to_string()),
        model: Set(body.model.trim().to_string()),
        gauge: Set(body.gauge),
        color: Set(body.color),
        price_cents: Set(body.price_cents),
        stock: Set(0),
        low_stock_threshold: Set(body.low_stock_threshold.unwrap_or(5).max(0)),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    let created = if body.stock > 0 {
        inventory::adjust_stock(
            &txn,
            created,
            StockChange {
                change: body.stock,
                reason: "INITIAL_STOCK",
                order_id: None,
                admin_id: Some(admin_id),
            },
        )
        .await?
    } else {
        created
    };
    txn.commit().await?;
    ok(created)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItem {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub gauge: Option<i32>,
    pub color: Option<String>,
    pub price_cents: Option<i64>,
    pub low_stock_threshold: Option<i32>,
    pub is_active: Option<bool>,
}

/// PATCH /admin/inventory/{item_id}. Stock only moves through adjustments.
#[tracing::instrument(name = "PATCH /admin/inventory/{item_id}", skip(state, user, body))]
pub async fn update_item(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(item_id): Path<String>,
    Json(body): Json<UpdateItem>,
) -> ApiResult<string_item::Model> {
    user.require_admin(&state).await?;
    let item = inventory::find_item(&state.db, &item_id).await?;

    let mut active: string_item::ActiveModel = item.into();
    if let Some(brand) = body.brand {
        active.brand = Set(brand);
    }
    if let Some(model) = body.model {
        active.model = Set(model);
    }
    if body.gauge.is_some() {
        active.gauge = Set(body.gauge);
    }
    if body.color.is_some() {
        active.color = Set(body.color);
    }
    if let Some(price) = body.price_cents {
        if price < 0 {
            return Err(ApiError::bad_request("Price cannot be negative"));
        }
        active.price_cents = Set(price);
    }
    if let Some(threshold) = body.low_stock_threshold {
        active.low_stock_threshold = Set(threshold.max(0));
    }
    if let Some(is_active) = body.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(now());
    ok(active.update(&state.db).await?)
}

#[derive(Debug, Deserialize)]
pub struct AdjustStock {
    pub change: i32,
    pub reason: String,
}

/// POST /admin/inventory/{item_id}/adjust
#[tracing::instrument(name = "POST /admin/inventory/{item_id}/adjust", skip(state, user, body))]
pub async fn adjust_stock(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(item_id): Path<String>,
    Json(body): Json<AdjustStock>,
) -> ApiResult<string_item::Model> {
    let admin_id = user.require_admin(&state).await?;
    let reason = body.reason.trim();
    if reason.is_empty() {
        return Err(ApiError::bad_request("An adjustment reason is required"));
    }
    if body.change == 0 {
        return Err(ApiError::bad_request("Adjustment cannot be zero"));
    }

    let txn = state.db.begin().await?;
    let item = inventory::lock_item(&txn, &item_id).await?;
    let updated = inventory::adjust_stock(
        &txn,
        item,
        StockChange {
            change: body.change,
            reason,
            order_id: None,
            admin_id: Some(admin_id),
        },
    )
    .await?;
    txn.commit().await?;
    ok(updated)
}

/// GET /admin/inventory/low-stock
#[tracing::instrument(name = "GET /admin/inventory/low-stock", skip(state, user))]
pub async fn low_stock(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> ApiResult<Vec<string_item::Model>> {
    user.require_admin(&state).await?;
    ok(analytics::low_stock(&state.db).await?)
}

/// GET /admin/inventory/{item_id}/logs
#[tracing::instrument(name = "GET /admin/inventory/{item_id}/logs", skip(state, user))]
pub async fn stock_logs(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(item_id): Path<String>,
    Query(query): Query<PaginationParams>,
) -> ApiResult<Vec<stock_log::Model>> {
    user.require_admin(&state).await?;
    let (limit, offset) = query.bounds();
    let logs = stock_log::Entity::find()
        .filter(stock_log::Column::StringItemId.eq(&item_id))
        .order_by_desc(stock_log::Column::CreatedAt)
        .limit(limit)
        .offset(offset)
        .all(&state.db)
        .await?;
    ok(logs)
}
