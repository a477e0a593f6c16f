use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, TransactionTrait,
};
use stringline::loyalty::referral_code_from;
use stringline_types::{create_id, now};

use crate::{
    entity::{
        order,
        sea_orm_active_enums::{MembershipTier, OrderStatus, UserRole},
        user,
    },
    error::ApiError,
    services::vouchers,
};

/// Returns the user row for `sub`, creating it (with a referral code and the
/// auto-issue vouchers) when the session belongs to a new customer.
pub async fn ensure_user(
    db: &DatabaseConnection,
    sub: &str,
    email: Option<String>,
    name: Option<String>,
) -> Result<user::Model, ApiError> {
    if let Some(existing) = user::Entity::find_by_id(sub).one(db).await? {
        return Ok(existing);
    }

    let txn = db.begin().await?;
    let referral_code = unique_referral_code(&txn).await?;
    let now = now();

    let created = user::ActiveModel {
        id: Set(sub.to_string()),
        email: Set(email),
        name: Set(name),
        phone: Set(None),
        role: Set(UserRole::Customer),
        points: Set(0),
        referral_code: Set(referral_code),
        referred_by: Set(None),
        membership_tier: Set(MembershipTier::Standard),
        total_spent: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    let issued = vouchers::issue_auto_vouchers(&txn, &created.id).await?;
    txn.commit().await?;

    tracing::info!(user_id = %created.id, vouchers = issued, "User created");
    Ok(created)
}

async fn unique_referral_code(conn: &impl ConnectionTrait) -> Result<String, ApiError> {
    for _ in 0..5 {
        let code = referral_code_from(&create_id());
        let taken = user::Entity::find()
            .filter(user::Column::ReferralCode.eq(&code))
            .count(conn)
            .await?;
        if taken == 0 {
            return Ok(code);
        }
    }
    Err(ApiError::internal("Could not allocate a referral code"))
}

pub async fn find_user(conn: &impl ConnectionTrait, id: &str) -> Result<user::Model, ApiError> {
    user::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User {} not found", id)))
}

/// Reads the user with a row lock, serializing balance updates.
pub async fn lock_user(conn: &impl ConnectionTrait, id: &str) -> Result<user::Model, ApiError> {
    user::Entity::find_by_id(id)
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User {} not found", id)))
}

/// Orders that count as "prior orders" for first-order-only offers.
pub async fn fulfilled_order_count(
    conn: &impl ConnectionTrait,
    user_id: &str,
) -> Result<u64, ApiError> {
    Ok(order::Entity::find()
        .filter(order::Column::UserId.eq(user_id))
        .filter(order::Column::Status.is_in([OrderStatus::Completed, OrderStatus::PickedUp]))
        .count(conn)
        .await?)
}

pub async fn admin_ids(conn: &impl ConnectionTrait) -> Result<Vec<String>, ApiError> {
    let admins = user::Entity::find()
        .filter(user::Column::Role.eq(UserRole::Admin))
        .all(conn)
        .await?;
    Ok(admins.into_iter().map(|u| u.id).collect())
}
