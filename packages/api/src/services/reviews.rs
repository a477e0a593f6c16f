use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use serde::Serialize;
use stringline::{analytics::average_rating, loyalty::REVIEW_REWARD_POINTS};
use stringline_types::{create_id, now};

use crate::{
    entity::review,
    error::ApiError,
    services::{orders, points},
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub count: u64,
    pub average_rating: Option<f64>,
}

/// Reviews a fulfilled order of the caller and pays the review reward.
pub async fn create(
    db: &DatabaseConnection,
    user_id: &str,
    order_id: &str,
    rating: i32,
    comment: Option<String>,
) -> Result<review::Model, ApiError> {
    if !(1..=5).contains(&rating) {
        return Err(ApiError::bad_request("Rating must be between 1 and 5"));
    }
    let comment = comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());

    let txn = db.begin().await?;
    let reviewed = orders::find_owned(&txn, user_id, order_id).await?;
    if !reviewed.status.is_fulfilled() {
        return Err(ApiError::bad_request(
            "Only completed orders can be reviewed",
        ));
    }
    let existing = review::Entity::find()
        .filter(review::Column::OrderId.eq(order_id))
        .count(&txn)
        .await?;
    if existing > 0 {
        return Err(ApiError::conflict("This order has already been reviewed"));
    }

    let created = review::ActiveModel {
        id: Set(create_id()),
        order_id: Set(order_id.to_string()),
        user_id: Set(user_id.to_string()),
        rating: Set(rating),
        comment: Set(comment),
        created_at: Set(now()),
    }
    .insert(&txn)
    .await?;

    points::append(
        &txn,
        user_id,
        REVIEW_REWARD_POINTS,
        "REVIEW",
        Some(created.id.clone()),
    )
    .await?;
    txn.commit().await?;

    tracing::info!(review_id = %created.id, order_id, rating, "Review created");
    Ok(created)
}

pub async fn list(
    conn: &impl ConnectionTrait,
    limit: u64,
    offset: u64,
) -> Result<(Vec<review::Model>, u64), ApiError> {
    let total = review::Entity::find().count(conn).await?;
    let items = review::Entity::find()
        .order_by_desc(review::Column::CreatedAt)
        .limit(limit)
        .offset(offset)
        .all(conn)
        .await?;
    Ok((items, total))
}

pub async fn find_for_order(
    conn: &impl ConnectionTrait,
    order_id: &str,
) -> Result<Option<review::Model>, ApiError> {
    Ok(review::Entity::find()
        .filter(review::Column::OrderId.eq(order_id))
        .one(conn)
        .await?)
}

pub async fn summary(conn: &impl ConnectionTrait) -> Result<ReviewSummary, ApiError> {
    let ratings: Vec<i32> = review::Entity::find()
        .select_only()
        .column(review::Column::Rating)
        .into_tuple()
        .all(conn)
        .await?;
    Ok(ReviewSummary {
        count: ratings.len() as u64,
        average_rating: average_rating(&ratings),
    })
}
