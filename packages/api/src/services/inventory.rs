use sea_orm::{ActiveModelTrait, ActiveValue::Set, ConnectionTrait, EntityTrait, QuerySelect};
use stringline_types::{create_id, now};

use crate::{
    entity::{stock_log, string_item},
    error::ApiError,
};

/// Units a single order consumes. One unit strings one racket.
pub const UNITS_PER_ORDER: i32 = 1;

pub struct StockChange<'a> {
    pub change: i32,
    pub reason: &'a str,
    pub order_id: Option<String>,
    pub admin_id: Option<String>,
}

pub async fn find_item(
    conn: &impl ConnectionTrait,
    id: &str,
) -> Result<string_item::Model, ApiError> {
    string_item::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("String {} not found", id)))
}

/// Like `find_item`, holding a row lock until the transaction ends so
/// concurrent orders cannot spend the same unit.
pub async fn lock_item(
    conn: &impl ConnectionTrait,
    id: &str,
) -> Result<string_item::Model, ApiError> {
    string_item::Entity::find_by_id(id)
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("String {} not found", id)))
}

/// Applies a signed stock change and records it. Stock never goes negative.
pub async fn adjust_stock(
    conn: &impl ConnectionTrait,
    item: string_item::Model,
    change: StockChange<'_>,
) -> Result<string_item::Model, ApiError> {
    let stock_after = item.stock.checked_add(change.change).ok_or_else(|| {
        ApiError::bad_request(format!("Stock change of {} is out of range", change.change))
    })?;
    if stock_after < 0 {
        return Err(ApiError::conflict(format!(
            "{} {} has only {} in stock",
            item.brand, item.model, item.stock
        )));
    }

    stock_log::ActiveModel {
        id: Set(create_id()),
        string_item_id: Set(item.id.clone()),
        change: Set(change.change),
        stock_after: Set(stock_after),
        reason: Set(change.reason.to_string()),
        order_id: Set(change.order_id),
        admin_id: Set(change.admin_id),
        created_at: Set(now()),
    }
    .insert(conn)
    .await?;

    let low = stock_after <= item.low_stock_threshold;
    let item_id = item.id.clone();
    let mut active: string_item::ActiveModel = item.into();
    active.stock = Set(stock_after);
    active.updated_at = Set(now());
    let updated = active.update(conn).await?;

    if low {
        tracing::warn!(string_item_id = %item_id, stock = stock_after, "Stock at or below threshold");
    }
    Ok(updated)
}
