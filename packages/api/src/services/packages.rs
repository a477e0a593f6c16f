use chrono::Duration;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use serde::Serialize;
use stringline::pricing::{apply_percent_off, ensure_first_order_eligible, renewal_discount_applies};
use stringline_types::{create_id, now};

use crate::{
    config::ServiceConfig,
    entity::{
        package, payment,
        sea_orm_active_enums::{PaymentProvider, UserPackageStatus},
        user_package,
    },
    error::ApiError,
    services::{notifications, payments, users::fulfilled_order_count},
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageQuote {
    pub package_id: String,
    pub list_price: i64,
    pub renewal_discount: bool,
    pub discount: i64,
    pub final_price: i64,
}

pub async fn find_package(conn: &impl ConnectionTrait, id: &str) -> Result<package::Model, ApiError> {
    package::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Package {} not found", id)))
}

/// Reads a held package with a row lock, so credit and status changes on it
/// are serialized.
async fn lock_owned(
    conn: &impl ConnectionTrait,
    user_package_id: &str,
) -> Result<Option<user_package::Model>, ApiError> {
    Ok(user_package::Entity::find_by_id(user_package_id)
        .lock_exclusive()
        .one(conn)
        .await?)
}

pub async fn list_active(conn: &impl ConnectionTrait) -> Result<Vec<package::Model>, ApiError> {
    Ok(package::Entity::find()
        .filter(package::Column::IsActive.eq(true))
        .order_by_asc(package::Column::PriceCents)
        .all(conn)
        .await?)
}

pub async fn list_for_user(
    conn: &impl ConnectionTrait,
    user_id: &str,
) -> Result<Vec<(user_package::Model, Option<package::Model>)>, ApiError> {
    Ok(user_package::Entity::find()
        .filter(user_package::Column::UserId.eq(user_id))
        .find_also_related(package::Entity)
        .order_by_desc(user_package::Column::CreatedAt)
        .all(conn)
        .await?)
}

/// Price for `user_id` buying `pkg`, including the renewal discount when an
/// active package of theirs is about to run out.
pub async fn quote(
    conn: &impl ConnectionTrait,
    config: &ServiceConfig,
    user_id: &str,
    pkg: &package::Model,
) -> Result<PackageQuote, ApiError> {
    if !pkg.is_active {
        return Err(ApiError::bad_request("Package is not available"));
    }
    let fulfilled = fulfilled_order_count(conn, user_id).await?;
    ensure_first_order_eligible(pkg.first_order_only, fulfilled)?;

    let now = now();
    let held = user_package::Entity::find()
        .filter(user_package::Column::UserId.eq(user_id))
        .filter(user_package::Column::Status.eq(UserPackageStatus::Active))
        .all(conn)
        .await?;
    let renewal = held
        .iter()
        .any(|p| renewal_discount_applies(p.expires_at, now, config.renewal_window_days));

    let final_price = if renewal {
        apply_percent_off(pkg.price_cents, config.renewal_discount_percent)
    } else {
        pkg.price_cents
    };

    Ok(PackageQuote {
        package_id: pkg.id.clone(),
        list_price: pkg.price_cents,
        renewal_discount: renewal,
        discount: pkg.price_cents - final_price,
        final_price,
    })
}

/// Creates the owned package awaiting payment plus its pending payment.
/// Free packages are activated straight away.
pub async fn purchase(
    db: &DatabaseConnection,
    config: &ServiceConfig,
    user_id: &str,
    package_id: &str,
    provider: PaymentProvider,
) -> Result<(user_package::Model, Option<payment::Model>), ApiError> {
    let txn = db.begin().await?;
    let pkg = find_package(&txn, package_id).await?;
    let quote = quote(&txn, config, user_id, &pkg).await?;
    let now = now();

    let owned = user_package::ActiveModel {
        id: Set(create_id()),
        user_id: Set(user_id.to_string()),
        package_id: Set(pkg.id.clone()),
        remaining: Set(0),
        expires_at: Set(None),
        status: Set(UserPackageStatus::PendingPayment),
        price_paid: Set(quote.final_price),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    let (owned, payment) = if quote.final_price == 0 {
        (activate(&txn, &owned.id).await?, None)
    } else {
        let payment = payments::insert_pending(
            &txn,
            user_id,
            payments::PaymentTarget::Package(owned.id.clone()),
            quote.final_price,
            provider,
        )
        .await?;
        (owned, Some(payment))
    };
    txn.commit().await?;

    tracing::info!(
        user_id,
        user_package_id = %owned.id,
        price = quote.final_price,
        renewal = quote.renewal_discount,
        "Package purchased"
    );
    Ok((owned, payment))
}

/// Grants the credits once the package has been paid for.
pub async fn activate(
    conn: &impl ConnectionTrait,
    user_package_id: &str,
) -> Result<user_package::Model, ApiError> {
    let owned = lock_owned(conn, user_package_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Package {} not found", user_package_id)))?;
    if owned.status != UserPackageStatus::PendingPayment {
        return Err(ApiError::conflict(format!(
            "Package {} is not awaiting payment",
            owned.id
        )));
    }
    let pkg = find_package(conn, &owned.package_id).await?;

    let now = now();
    let user_id = owned.user_id.clone();
    let mut active: user_package::ActiveModel = owned.into();
    active.status = Set(UserPackageStatus::Active);
    active.remaining = Set(pkg.sessions);
    active.expires_at = Set(Some(now + Duration::days(pkg.validity_days as i64)));
    active.updated_at = Set(now);
    let activated = active.update(conn).await?;

    notifications::notify(
        conn,
        &user_id,
        "Package activated",
        format!("{} is active with {} sessions.", pkg.name, pkg.sessions),
    )
    .await?;
    tracing::info!(user_package_id = %activated.id, sessions = pkg.sessions, "Package activated");
    Ok(activated)
}

/// Takes one credit for an order. The package must be the caller's, active,
/// unexpired and not empty.
pub async fn consume_credit(
    conn: &impl ConnectionTrait,
    user_id: &str,
    user_package_id: &str,
) -> Result<user_package::Model, ApiError> {
    let owned = lock_owned(conn, user_package_id)
        .await?
        .filter(|p| p.user_id == user_id)
        .ok_or_else(|| ApiError::not_found(format!("Package {} not found", user_package_id)))?;

    if owned.status != UserPackageStatus::Active {
        return Err(ApiError::bad_request("Package is not active"));
    }
    if owned.expires_at.map(|e| e < now()).unwrap_or(false) {
        return Err(ApiError::bad_request("Package has expired"));
    }
    if owned.remaining < 1 {
        return Err(ApiError::bad_request("Package has no sessions left"));
    }

    let remaining = owned.remaining - 1;
    let mut active: user_package::ActiveModel = owned.into();
    active.remaining = Set(remaining);
    if remaining == 0 {
        active.status = Set(UserPackageStatus::Exhausted);
    }
    active.updated_at = Set(now());
    Ok(active.update(conn).await?)
}

/// Gives back the credit of a cancelled order.
pub async fn refund_credit(
    conn: &impl ConnectionTrait,
    user_package_id: &str,
) -> Result<(), ApiError> {
    let Some(owned) = lock_owned(conn, user_package_id).await? else {
        return Ok(());
    };
    let remaining = owned.remaining + 1;
    let expired = owned.expires_at.map(|e| e < now()).unwrap_or(false);
    let mut active: user_package::ActiveModel = owned.into();
    active.remaining = Set(remaining);
    if !expired {
        active.status = Set(UserPackageStatus::Active);
    }
    active.updated_at = Set(now());
    active.update(conn).await?;
    Ok(())
}

/// Marks active packages past their expiry as expired. Returns how many.
pub async fn expire_stale(conn: &impl ConnectionTrait) -> Result<u64, ApiError> {
    let now = now();
    let result = user_package::Entity::update_many()
        .col_expr(
            user_package::Column::Status,
            sea_orm::sea_query::Expr::value(UserPackageStatus::Expired),
        )
        .col_expr(user_package::Column::UpdatedAt, sea_orm::sea_query::Expr::value(now))
        .filter(user_package::Column::Status.eq(UserPackageStatus::Active))
        .filter(user_package::Column::ExpiresAt.lt(now))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}
