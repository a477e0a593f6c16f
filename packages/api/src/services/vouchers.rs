use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, sea_query::Expr,
};
use stringline::pricing::ensure_first_order_eligible;
use stringline_types::{create_id, now};

use crate::{
    entity::{sea_orm_active_enums::UserVoucherStatus, user_voucher, voucher},
    error::ApiError,
    services::{points, users::fulfilled_order_count},
};

/// A held voucher that passed every eligibility check for a given price.
pub struct AppliedVoucher {
    pub user_voucher: user_voucher::Model,
    pub voucher: voucher::Model,
    pub discount: i64,
}

pub async fn find_voucher(conn: &impl ConnectionTrait, id: &str) -> Result<voucher::Model, ApiError> {
    voucher::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Voucher {} not found", id)))
}

async fn grant(
    conn: &impl ConnectionTrait,
    user_id: &str,
    voucher_id: &str,
) -> Result<user_voucher::Model, ApiError> {
    let now = now();
    let granted = user_voucher::ActiveModel {
        id: Set(create_id()),
        user_id: Set(user_id.to_string()),
        voucher_id: Set(voucher_id.to_string()),
        status: Set(UserVoucherStatus::Available),
        order_id: Set(None),
        used_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?;
    Ok(granted)
}

/// Hands every active auto-issue voucher to a freshly created user.
pub async fn issue_auto_vouchers(
    conn: &impl ConnectionTrait,
    user_id: &str,
) -> Result<usize, ApiError> {
    let now = now();
    let templates = voucher::Entity::find()
        .filter(voucher::Column::AutoIssue.eq(true))
        .filter(voucher::Column::IsActive.eq(true))
        .all(conn)
        .await?;

    let mut issued = 0;
    for template in templates.iter().filter(|v| v.is_usable_at(now)) {
        grant(conn, user_id, &template.id).await?;
        issued += 1;
    }
    Ok(issued)
}

/// Held vouchers with their definitions, newest first.
pub async fn list_for_user(
    conn: &impl ConnectionTrait,
    user_id: &str,
) -> Result<Vec<(user_voucher::Model, Option<voucher::Model>)>, ApiError> {
    Ok(user_voucher::Entity::find()
        .filter(user_voucher::Column::UserId.eq(user_id))
        .find_also_related(voucher::Entity)
        .order_by_desc(user_voucher::Column::CreatedAt)
        .all(conn)
        .await?)
}

/// Checks ownership, availability, expiry, first-order restriction and
/// minimum spend, then computes the discount for `price`.
pub async fn check_applicable(
    conn: &impl ConnectionTrait,
    user_id: &str,
    user_voucher_id: &str,
    price: i64,
) -> Result<AppliedVoucher, ApiError> {
    let (held, template) = user_voucher::Entity::find_by_id(user_voucher_id)
        .find_also_related(voucher::Entity)
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Voucher {} not found", user_voucher_id)))?;

    if held.user_id != user_id {
        return Err(ApiError::NOT_FOUND);
    }
    let template = template.ok_or_else(|| ApiError::internal("Held voucher without definition"))?;

    if held.status != UserVoucherStatus::Available {
        return Err(ApiError::conflict("Voucher has already been used"));
    }
    if !template.is_usable_at(now()) {
        return Err(ApiError::bad_request("Voucher has expired"));
    }

    let fulfilled = fulfilled_order_count(conn, user_id).await?;
    ensure_first_order_eligible(template.first_order_only, fulfilled)?;
    let discount = template.terms().discount_for(price)?;

    Ok(AppliedVoucher {
        user_voucher: held,
        voucher: template,
        discount,
    })
}

/// Flips a held voucher to used. The write only matches while the voucher
/// is still available, so two orders cannot spend it.
pub async fn mark_used(
    conn: &impl ConnectionTrait,
    held: user_voucher::Model,
    order_id: &str,
) -> Result<(), ApiError> {
    let now = now();
    let result = user_voucher::Entity::update_many()
        .col_expr(user_voucher::Column::Status, Expr::value(UserVoucherStatus::Used))
        .col_expr(user_voucher::Column::OrderId, Expr::value(order_id))
        .col_expr(user_voucher::Column::UsedAt, Expr::value(now))
        .col_expr(user_voucher::Column::UpdatedAt, Expr::value(now))
        .filter(user_voucher::Column::Id.eq(&held.id))
        .filter(user_voucher::Column::Status.eq(UserVoucherStatus::Available))
        .exec(conn)
        .await?;
    if result.rows_affected != 1 {
        return Err(ApiError::conflict("Voucher has already been used"));
    }
    Ok(())
}

/// Puts a voucher consumed by a cancelled order back into the wallet.
pub async fn restore(conn: &impl ConnectionTrait, user_voucher_id: &str) -> Result<(), ApiError> {
    let Some(held) = user_voucher::Entity::find_by_id(user_voucher_id).one(conn).await? else {
        return Ok(());
    };
    if held.status != UserVoucherStatus::Used {
        return Ok(());
    }
    let mut active: user_voucher::ActiveModel = held.into();
    active.status = Set(UserVoucherStatus::Available);
    active.order_id = Set(None);
    active.used_at = Set(None);
    active.updated_at = Set(now());
    active.update(conn).await?;
    Ok(())
}

/// Exchanges points for a voucher that carries a points price.
pub async fn redeem_with_points(
    conn: &impl ConnectionTrait,
    user_id: &str,
    voucher_id: &str,
) -> Result<user_voucher::Model, ApiError> {
    let template = find_voucher(conn, voucher_id).await?;
    let cost = template
        .points_cost
        .filter(|c| *c > 0)
        .ok_or_else(|| ApiError::bad_request("Voucher cannot be redeemed with points"))?;
    if !template.is_usable_at(now()) {
        return Err(ApiError::bad_request("Voucher is no longer available"));
    }

    points::append(
        conn,
        user_id,
        -cost,
        "VOUCHER_REDEMPTION",
        Some(template.id.clone()),
    )
    .await?;
    let granted = grant(conn, user_id, &template.id).await?;

    tracing::info!(user_id, voucher_id = %template.id, cost, "Voucher redeemed with points");
    Ok(granted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn available() -> user_voucher::Model {
        let at = chrono::NaiveDate::from_ymd_opt(2025, 4, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        user_voucher::Model {
            id: "uv_1".into(),
            user_id: "user_1".into(),
            voucher_id: "v_1".into(),
            status: UserVoucherStatus::Available,
            order_id: None,
            used_at: None,
            created_at: at,
            updated_at: at,
        }
    }

    fn affected(rows: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: rows,
        }
    }

    #[tokio::test]
    async fn spending_a_voucher_only_matches_available_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([affected(1)])
            .into_connection();

        mark_used(&db, available(), "ord_1").await.unwrap();

        let log = db.into_transaction_log();
        let sql = &log[0].statements()[0].sql;
        assert!(sql.starts_with("UPDATE"));
        assert!(sql.contains("\"status\" = $"));
    }

    #[tokio::test]
    async fn voucher_spent_by_a_racing_order_is_a_conflict() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([affected(0)])
            .into_connection();

        let err = mark_used(&db, available(), "ord_2").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }
}
