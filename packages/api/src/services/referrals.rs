use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use stringline::loyalty::referral_reward;
use stringline_types::{create_id, now};

use crate::{
    entity::{referral_log, user},
    error::ApiError,
    services::{notifications, points, users},
};

/// Links `user` to the owner of `code`. Allowed once, never for one's own
/// code, and only before the first fulfilled order.
pub async fn apply_code(
    conn: &impl ConnectionTrait,
    user: user::Model,
    code: &str,
) -> Result<user::Model, ApiError> {
    let code = code.trim().to_ascii_uppercase();
    if code.is_empty() {
        return Err(ApiError::bad_request("Referral code is required"));
    }
    if user.referred_by.is_some() {
        return Err(ApiError::conflict("A referral code has already been applied"));
    }
    if user.referral_code == code {
        return Err(ApiError::bad_request("You cannot use your own referral code"));
    }
    if users::fulfilled_order_count(conn, &user.id).await? > 0 {
        return Err(ApiError::bad_request(
            "Referral codes can only be applied before your first completed order",
        ));
    }

    let referrer = user::Entity::find()
        .filter(user::Column::ReferralCode.eq(&code))
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::not_found("Referral code not found"))?;

    let mut active: user::ActiveModel = user.into();
    active.referred_by = Set(Some(referrer.id.clone()));
    active.updated_at = Set(now());
    let updated = active.update(conn).await?;

    tracing::info!(user_id = %updated.id, referrer_id = %referrer.id, "Referral code applied");
    Ok(updated)
}

/// Pays the referrer once, when the referee's first order completes.
/// Returns the points granted, if any.
pub async fn reward_on_first_completion(
    conn: &impl ConnectionTrait,
    referee: &user::Model,
) -> Result<Option<i64>, ApiError> {
    let Some(referrer_id) = referee.referred_by.as_deref() else {
        return Ok(None);
    };

    let already = referral_log::Entity::find()
        .filter(referral_log::Column::RefereeId.eq(&referee.id))
        .count(conn)
        .await?;
    if already > 0 {
        return Ok(None);
    }

    let previous = referral_log::Entity::find()
        .filter(referral_log::Column::ReferrerId.eq(referrer_id))
        .count(conn)
        .await?;
    let reward = referral_reward(previous + 1);

    referral_log::ActiveModel {
        id: Set(create_id()),
        referrer_id: Set(referrer_id.to_string()),
        referee_id: Set(referee.id.clone()),
        points: Set(reward),
        created_at: Set(now()),
    }
    .insert(conn)
    .await?;

    points::append(
        conn,
        referrer_id,
        reward,
        "REFERRAL_REWARD",
        Some(referee.id.clone()),
    )
    .await?;
    notifications::notify(
        conn,
        referrer_id,
        "Referral reward",
        format!("A friend completed their first order. You earned {} points.", reward),
    )
    .await?;

    tracing::info!(referrer_id, referee_id = %referee.id, reward, "Referral reward granted");
    Ok(Some(reward))
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralSummary {
    pub referral_code: String,
    pub referred_by: Option<String>,
    pub successful_referrals: u64,
    pub points_earned: i64,
    pub rewards: Vec<referral_log::Model>,
}

pub async fn summary(
    conn: &impl ConnectionTrait,
    user: &user::Model,
) -> Result<ReferralSummary, ApiError> {
    let rewards = referral_log::Entity::find()
        .filter(referral_log::Column::ReferrerId.eq(&user.id))
        .order_by_desc(referral_log::Column::CreatedAt)
        .all(conn)
        .await?;
    Ok(ReferralSummary {
        referral_code: user.referral_code.clone(),
        referred_by: user.referred_by.clone(),
        successful_referrals: rewards.len() as u64,
        points_earned: rewards.iter().map(|r| r.points).sum(),
        rewards,
    })
}
