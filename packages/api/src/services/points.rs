use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use stringline::loyalty::{PointsStats, ensure_balance};
use stringline_types::{create_id, now};

use crate::{
    entity::{points_log, user},
    error::ApiError,
    services::users::lock_user,
};

/// Appends a ledger entry and moves the denormalized balance with it.
/// Spending more than the balance is rejected before anything is written.
pub async fn append(
    conn: &impl ConnectionTrait,
    user_id: &str,
    delta: i64,
    reason: &str,
    reference: Option<String>,
) -> Result<user::Model, ApiError> {
    let user = lock_user(conn, user_id).await?;
    if delta < 0 {
        ensure_balance(user.points, -delta)?;
    }

    points_log::ActiveModel {
        id: Set(create_id()),
        user_id: Set(user_id.to_string()),
        delta: Set(delta),
        reason: Set(reason.to_string()),
        reference: Set(reference),
        created_at: Set(now()),
    }
    .insert(conn)
    .await?;

    let balance = user.points + delta;
    let mut active: user::ActiveModel = user.into();
    active.points = Set(balance);
    active.updated_at = Set(now());
    let updated = active.update(conn).await?;

    tracing::info!(user_id, delta, balance, reason, "Points ledger updated");
    Ok(updated)
}

pub async fn history(
    conn: &impl ConnectionTrait,
    user_id: &str,
    limit: u64,
    offset: u64,
) -> Result<Vec<points_log::Model>, ApiError> {
    Ok(points_log::Entity::find()
        .filter(points_log::Column::UserId.eq(user_id))
        .order_by_desc(points_log::Column::CreatedAt)
        .limit(limit)
        .offset(offset)
        .all(conn)
        .await?)
}

/// Earned/spent totals for one user, or for everyone when `user_id` is None.
pub async fn stats(
    conn: &impl ConnectionTrait,
    user_id: Option<&str>,
) -> Result<PointsStats, ApiError> {
    let mut query = points_log::Entity::find()
        .select_only()
        .column(points_log::Column::Delta);
    if let Some(user_id) = user_id {
        query = query.filter(points_log::Column::UserId.eq(user_id));
    }
    let deltas: Vec<i64> = query.into_tuple().all(conn).await?;
    Ok(PointsStats::from_deltas(deltas))
}
