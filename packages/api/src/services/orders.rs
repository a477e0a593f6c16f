use chrono::{Duration, NaiveDateTime};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use stringline::{
    eta::effective_eta,
    loyalty::{MembershipTier, points_for_order},
    order::validate_tension,
};
use stringline_types::{create_id, now};

use crate::{
    config::ServiceConfig,
    entity::{
        order, order_status_log, payment,
        sea_orm_active_enums::{OrderStatus, PaymentProvider},
    },
    error::ApiError,
    services::{
        inventory::{self, StockChange, UNITS_PER_ORDER},
        notifications, packages, payments, points, referrals, users, vouchers,
    },
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrder {
    pub string_item_id: String,
    pub tension_main: i32,
    pub tension_cross: i32,
    pub racket_brand: Option<String>,
    pub racket_model: Option<String>,
    pub notes: Option<String>,
    pub user_package_id: Option<String>,
    pub user_voucher_id: Option<String>,
    pub provider: Option<PaymentProvider>,
}

/// An order as the API returns it, with its display label and ETA.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(flatten)]
    pub order: order::Model,
    pub status_label: &'static str,
    pub eta: Option<NaiveDateTime>,
}

impl OrderView {
    pub fn new(order: order::Model, config: &ServiceConfig) -> Self {
        let eta = effective_eta(order.confirmed_at, config.turnaround_hours, order.eta_override);
        Self {
            status_label: order.status.label(),
            eta,
            order,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub overdue: Option<bool>,
    pub user_id: Option<String>,
}

pub async fn find_order(conn: &impl ConnectionTrait, id: &str) -> Result<order::Model, ApiError> {
    order::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Order {} not found", id)))
}

/// Reads the order with a row lock held until the transaction ends.
async fn lock_order(conn: &impl ConnectionTrait, id: &str) -> Result<order::Model, ApiError> {
    order::Entity::find_by_id(id)
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Order {} not found", id)))
}

pub async fn find_owned(
    conn: &impl ConnectionTrait,
    user_id: &str,
    id: &str,
) -> Result<order::Model, ApiError> {
    let found = find_order(conn, id).await?;
    if found.user_id != user_id {
        return Err(ApiError::not_found(format!("Order {} not found", id)));
    }
    Ok(found)
}

pub async fn list(
    conn: &impl ConnectionTrait,
    filter: &OrderFilter,
    limit: u64,
    offset: u64,
) -> Result<(Vec<order::Model>, u64), ApiError> {
    let mut condition = Condition::all();
    if let Some(status) = filter.status {
        condition = condition.add(order::Column::Status.eq(status));
    }
    if let Some(overdue) = filter.overdue {
        condition = condition.add(order::Column::IsOverdue.eq(overdue));
    }
    if let Some(user_id) = &filter.user_id {
        condition = condition.add(order::Column::UserId.eq(user_id));
    }

    let query = order::Entity::find().filter(condition);
    let total = query.clone().count(conn).await?;
    let items = query
        .order_by_desc(order::Column::CreatedAt)
        .limit(limit)
        .offset(offset)
        .all(conn)
        .await?;
    Ok((items, total))
}

pub async fn status_history(
    conn: &impl ConnectionTrait,
    order_id: &str,
) -> Result<Vec<order_status_log::Model>, ApiError> {
    Ok(order_status_log::Entity::find()
        .filter(order_status_log::Column::OrderId.eq(order_id))
        .order_by_asc(order_status_log::Column::CreatedAt)
        .all(conn)
        .await?)
}

async fn log_status(
    conn: &impl ConnectionTrait,
    order_id: &str,
    from: Option<OrderStatus>,
    to: OrderStatus,
    note: Option<String>,
    actor_id: Option<&str>,
) -> Result<(), ApiError> {
    order_status_log::ActiveModel {
        id: Set(create_id()),
        order_id: Set(order_id.to_string()),
        from_status: Set(from),
        to_status: Set(to),
        note: Set(note),
        actor_id: Set(actor_id.map(str::to_string)),
        created_at: Set(now()),
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// Books a racket in. Either spends a package credit or prices the order,
/// applying a held voucher and opening a payment for what is left to pay.
pub async fn create(
    db: &DatabaseConnection,
    user_id: &str,
    input: CreateOrder,
) -> Result<(order::Model, Option<payment::Model>), ApiError> {
    validate_tension(input.tension_main)?;
    validate_tension(input.tension_cross)?;
    if input.user_package_id.is_some() && input.user_voucher_id.is_some() {
        return Err(ApiError::bad_request(
            "A voucher cannot be combined with a package credit",
        ));
    }

    let txn = db.begin().await?;
    let item = inventory::lock_item(&txn, &input.string_item_id).await?;
    if !item.is_active {
        return Err(ApiError::bad_request(format!(
            "{} {} is not available",
            item.brand, item.model
        )));
    }
    if item.stock < UNITS_PER_ORDER {
        return Err(ApiError::conflict(format!(
            "{} {} is out of stock",
            item.brand, item.model
        )));
    }

    let order_id = create_id();
    let price = item.price_cents;
    let (discount, final_price, user_package_id, user_voucher_id) =
        if let Some(user_package_id) = input.user_package_id {
            let owned = packages::consume_credit(&txn, user_id, &user_package_id).await?;
            (price, 0, Some(owned.id), None)
        } else if let Some(user_voucher_id) = input.user_voucher_id {
            let applied = vouchers::check_applicable(&txn, user_id, &user_voucher_id, price).await?;
            let held_id = applied.user_voucher.id.clone();
            vouchers::mark_used(&txn, applied.user_voucher, &order_id).await?;
            (applied.discount, price - applied.discount, None, Some(held_id))
        } else {
            (0, price, None, None)
        };

    inventory::adjust_stock(
        &txn,
        item,
        StockChange {
            change: -UNITS_PER_ORDER,
            reason: "ORDER",
            order_id: Some(order_id.clone()),
            admin_id: None,
        },
    )
    .await?;

    let now = now();
    let created = order::ActiveModel {
        id: Set(order_id.clone()),
        user_id: Set(user_id.to_string()),
        string_item_id: Set(input.string_item_id),
        tension_main: Set(input.tension_main),
        tension_cross: Set(input.tension_cross),
        racket_brand: Set(input.racket_brand),
        racket_model: Set(input.racket_model),
        notes: Set(input.notes),
        status: Set(OrderStatus::Pending),
        price: Set(price),
        discount: Set(discount),
        final_price: Set(final_price),
        user_package_id: Set(user_package_id),
        user_voucher_id: Set(user_voucher_id),
        is_overdue: Set(false),
        status_changed_at: Set(now),
        confirmed_at: Set(None),
        eta_override: Set(None),
        completed_at: Set(None),
        points_awarded: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    log_status(&txn, &created.id, None, OrderStatus::Pending, None, Some(user_id)).await?;

    let payment = if final_price > 0 {
        let provider = input.provider.unwrap_or(PaymentProvider::Manual);
        Some(
            payments::insert_pending(
                &txn,
                user_id,
                payments::PaymentTarget::Order(created.id.clone()),
                final_price,
                provider,
            )
            .await?,
        )
    } else {
        None
    };
    txn.commit().await?;

    tracing::info!(
        order_id = %created.id,
        user_id,
        price,
        discount,
        final_price,
        "Order created"
    );
    Ok((created, payment))
}

/// Writes a status change with its audit row, resets the overdue clock and
/// runs the completion rewards the first time an order is fulfilled.
pub async fn transition(
    conn: &impl ConnectionTrait,
    current: order::Model,
    next: OrderStatus,
    note: Option<String>,
    actor_id: Option<&str>,
) -> Result<order::Model, ApiError> {
    let from = current.status;
    from.ensure_can_move_to(next)?;

    let now = now();
    let award = next.is_fulfilled() && !current.points_awarded;
    let customer_id = current.user_id.clone();
    let final_price = current.final_price;
    let needs_confirmed_at = next == OrderStatus::Confirmed && current.confirmed_at.is_none();
    let needs_completed_at = next.is_fulfilled() && current.completed_at.is_none();

    let mut active: order::ActiveModel = current.into();
    active.status = Set(next);
    active.status_changed_at = Set(now);
    active.is_overdue = Set(false);
    if needs_confirmed_at {
        active.confirmed_at = Set(Some(now));
    }
    if needs_completed_at {
        active.completed_at = Set(Some(now));
    }
    if award {
        active.points_awarded = Set(true);
    }
    active.updated_at = Set(now);
    let updated = active.update(conn).await?;

    log_status(conn, &updated.id, Some(from), next, note, actor_id).await?;

    if award {
        award_completion(conn, &customer_id, &updated.id, final_price).await?;
    }

    if from != next {
        notifications::notify(
            conn,
            &customer_id,
            format!("Order {}", next.label()),
            format!("Your order is now: {}.", next.label()),
        )
        .await?;
    }

    tracing::info!(order_id = %updated.id, from = %from, to = %next, "Order status changed");
    Ok(updated)
}

async fn award_completion(
    conn: &impl ConnectionTrait,
    user_id: &str,
    order_id: &str,
    final_price: i64,
) -> Result<(), ApiError> {
    let customer = users::lock_user(conn, user_id).await?;
    let earned = points_for_order(final_price, customer.membership_tier);
    let customer = if earned > 0 {
        points::append(conn, user_id, earned, "ORDER_COMPLETED", Some(order_id.to_string())).await?
    } else {
        customer
    };

    let total_spent = customer.total_spent + final_price.max(0);
    let tier = MembershipTier::for_total_spent(total_spent);
    let promoted = tier > customer.membership_tier;
    let mut active: crate::entity::user::ActiveModel = customer.into();
    active.total_spent = Set(total_spent);
    active.membership_tier = Set(tier);
    active.updated_at = Set(now());
    let customer = active.update(conn).await?;

    if promoted {
        notifications::notify(
            conn,
            user_id,
            "Membership upgraded",
            format!("You are now a {} member.", tier.label()),
        )
        .await?;
    }

    referrals::reward_on_first_completion(conn, &customer).await?;
    tracing::info!(user_id, order_id, earned, total_spent, "Completion rewards applied");
    Ok(())
}

/// Gives back everything a not yet started order holds: the package credit,
/// the voucher, open payments and the reserved stock unit.
async fn release(
    conn: &impl ConnectionTrait,
    current: &order::Model,
    actor_id: &str,
) -> Result<(), ApiError> {
    if let Some(user_package_id) = &current.user_package_id {
        packages::refund_credit(conn, user_package_id).await?;
    }
    if let Some(user_voucher_id) = &current.user_voucher_id {
        vouchers::restore(conn, user_voucher_id).await?;
    }
    payments::cancel_pending_for_order(conn, &current.id).await?;

    let item = inventory::lock_item(conn, &current.string_item_id).await?;
    inventory::adjust_stock(
        conn,
        item,
        StockChange {
            change: UNITS_PER_ORDER,
            reason: "ORDER_CANCELLED",
            order_id: Some(current.id.clone()),
            admin_id: None,
        },
    )
    .await?;
    tracing::debug!(order_id = %current.id, actor_id, "Order resources released");
    Ok(())
}

/// Cancels a pending order. Owners may cancel their own; admins any.
pub async fn cancel(
    db: &DatabaseConnection,
    actor_id: &str,
    is_admin: bool,
    order_id: &str,
) -> Result<order::Model, ApiError> {
    let txn = db.begin().await?;
    let current = lock_order(&txn, order_id).await?;
    if !is_admin && current.user_id != actor_id {
        return Err(ApiError::not_found(format!("Order {} not found", order_id)));
    }
    current.status.ensure_cancellable()?;

    release(&txn, &current, actor_id).await?;
    let cancelled = transition(
        &txn,
        current,
        OrderStatus::Cancelled,
        Some("Cancelled".to_string()),
        Some(actor_id),
    )
    .await?;
    txn.commit().await?;
    Ok(cancelled)
}

/// Admin status write. Cancelling is only possible while the order is
/// pending and releases its resources like a customer cancellation.
pub async fn update_status(
    db: &DatabaseConnection,
    admin_id: &str,
    order_id: &str,
    next: OrderStatus,
    note: Option<String>,
) -> Result<order::Model, ApiError> {
    let txn = db.begin().await?;
    let current = lock_order(&txn, order_id).await?;
    if next == OrderStatus::Cancelled {
        current.status.ensure_cancellable()?;
        release(&txn, &current, admin_id).await?;
    } else {
        current.status.ensure_can_move_to(next)?;
    }
    let updated = transition(&txn, current, next, note, Some(admin_id)).await?;
    txn.commit().await?;
    Ok(updated)
}

pub async fn set_eta(
    db: &DatabaseConnection,
    order_id: &str,
    eta: Option<NaiveDateTime>,
) -> Result<order::Model, ApiError> {
    let current = find_order(db, order_id).await?;
    if current.status.is_terminal() {
        return Err(ApiError::conflict(format!(
            "Order {} is {} and has no ETA",
            order_id,
            current.status.as_str()
        )));
    }
    let mut active: order::ActiveModel = current.into();
    active.eta_override = Set(eta);
    active.updated_at = Set(now());
    let updated = active.update(db).await?;
    tracing::info!(order_id, eta = ?eta, "ETA override set");
    Ok(updated)
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub flagged_overdue: u64,
    pub expired_packages: u64,
}

/// Flags orders stuck in the workshop for longer than `overdue_hours` and
/// expires lapsed packages. Safe to run repeatedly.
pub async fn sweep_overdue(
    db: &DatabaseConnection,
    overdue_hours: i64,
) -> Result<SweepReport, ApiError> {
    let now = now();
    let cutoff = now - Duration::hours(overdue_hours);

    let flagged = order::Entity::update_many()
        .col_expr(order::Column::IsOverdue, Expr::value(true))
        .col_expr(order::Column::UpdatedAt, Expr::value(now))
        .filter(order::Column::Status.is_in([OrderStatus::Confirmed, OrderStatus::InProgress]))
        .filter(order::Column::IsOverdue.eq(false))
        .filter(order::Column::StatusChangedAt.lt(cutoff))
        .exec(db)
        .await?
        .rows_affected;
    let expired_packages = packages::expire_stale(db).await?;

    if flagged > 0 {
        tracing::warn!(flagged, overdue_hours, "Orders flagged as overdue");
    }
    tracing::info!(flagged, expired_packages, "Order automation sweep finished");
    Ok(SweepReport {
        flagged_overdue: flagged,
        expired_packages,
    })
}

pub async fn overdue_count(conn: &impl ConnectionTrait) -> Result<u64, ApiError> {
    Ok(order::Entity::find()
        .filter(order::Column::IsOverdue.eq(true))
        .filter(order::Column::Status.is_in([OrderStatus::Confirmed, OrderStatus::InProgress]))
        .count(conn)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{
        notification,
        sea_orm_active_enums::{UserPackageStatus, UserVoucherStatus},
        stock_log, string_item, user_package, user_voucher,
    };
    use axum::http::StatusCode;
    use chrono::NaiveDate;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Transaction, Value};

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn far_future() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2099, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn item(stock: i32) -> string_item::Model {
        string_item::Model {
            id: "str_1".into(),
            brand: "Yonex".into(),
            model: "BG80".into(),
            gauge: Some(68),
            color: Some("white".into()),
            price_cents: 2500,
            stock,
            low_stock_threshold: 2,
            is_active: true,
            created_at: at(),
            updated_at: at(),
        }
    }

    fn held_package(remaining: i32, status: UserPackageStatus) -> user_package::Model {
        user_package::Model {
            id: "up_1".into(),
            user_id: "user_1".into(),
            package_id: "pkg_1".into(),
            remaining,
            expires_at: Some(far_future()),
            status,
            price_paid: 9000,
            created_at: at(),
            updated_at: at(),
        }
    }

    fn held_voucher(status: UserVoucherStatus) -> user_voucher::Model {
        user_voucher::Model {
            id: "uv_1".into(),
            user_id: "user_1".into(),
            voucher_id: "v_1".into(),
            status,
            order_id: Some("ord_1".into()),
            used_at: Some(at()),
            created_at: at(),
            updated_at: at(),
        }
    }

    fn stock_entry(change: i32, stock_after: i32) -> stock_log::Model {
        stock_log::Model {
            id: "sl_1".into(),
            string_item_id: "str_1".into(),
            change,
            stock_after,
            reason: "ORDER".into(),
            order_id: Some("ord_1".into()),
            admin_id: None,
            created_at: at(),
        }
    }

    fn status_entry(to: OrderStatus) -> order_status_log::Model {
        order_status_log::Model {
            id: "osl_1".into(),
            order_id: "ord_1".into(),
            from_status: None,
            to_status: to,
            note: None,
            actor_id: None,
            created_at: at(),
        }
    }

    fn inbox_entry() -> notification::Model {
        notification::Model {
            id: "n_1".into(),
            user_id: "user_1".into(),
            title: "Order".into(),
            body: "Order".into(),
            read: false,
            read_at: None,
            created_at: at(),
        }
    }

    fn rows(affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: affected,
        }
    }

    fn statements(log: Vec<Transaction>) -> Vec<sea_orm::Statement> {
        log.iter().flat_map(|t| t.statements().to_vec()).collect()
    }

    fn writes_to(statements: &[sea_orm::Statement], verb: &str, table: &str) -> bool {
        let table = format!("\"{}\"", table);
        statements
            .iter()
            .any(|s| s.sql.starts_with(verb) && s.sql.contains(&table))
    }

    fn bound_values(statements: &[sea_orm::Statement], verb: &str, table: &str) -> Vec<Value> {
        let table = format!("\"{}\"", table);
        statements
            .iter()
            .filter(|s| s.sql.starts_with(verb) && s.sql.contains(&table))
            .flat_map(|s| s.values.clone().map(|v| v.0).unwrap_or_default())
            .collect()
    }

    fn sample(status: OrderStatus) -> order::Model {
        let at = at();
        order::Model {
            id: "ord_1".into(),
            user_id: "user_1".into(),
            string_item_id: "str_1".into(),
            tension_main: 26,
            tension_cross: 27,
            racket_brand: Some("Yonex".into()),
            racket_model: None,
            notes: None,
            status,
            price: 2500,
            discount: 0,
            final_price: 2500,
            user_package_id: None,
            user_voucher_id: None,
            is_overdue: false,
            status_changed_at: at,
            confirmed_at: Some(at),
            eta_override: None,
            completed_at: None,
            points_awarded: false,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn view_carries_label_and_eta() {
        let config = ServiceConfig::default();
        let view = OrderView::new(sample(OrderStatus::InProgress), &config);
        assert_eq!(view.status_label, "Stringing in progress");
        let confirmed = view.order.confirmed_at.unwrap();
        assert_eq!(view.eta, Some(confirmed + Duration::hours(48)));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "in_progress");
        assert_eq!(json["statusLabel"], "Stringing in progress");
        assert_eq!(json["finalPrice"], 2500);
    }

    #[test]
    fn create_body_uses_camel_case() {
        let input: CreateOrder = serde_json::from_str(
            r#"{"stringItemId":"str_1","tensionMain":26,"tensionCross":28,"userVoucherId":"uv_1","provider":"GATEWAY"}"#,
        )
        .unwrap();
        assert_eq!(input.tension_cross, 28);
        assert_eq!(input.provider, Some(PaymentProvider::Gateway));
        assert!(input.user_package_id.is_none());
    }

    fn create_input() -> CreateOrder {
        CreateOrder {
            string_item_id: "str_1".into(),
            tension_main: 26,
            tension_cross: 27,
            racket_brand: None,
            racket_model: None,
            notes: None,
            user_package_id: None,
            user_voucher_id: None,
            provider: None,
        }
    }

    #[tokio::test]
    async fn package_credit_orders_are_free_and_open_no_payment() {
        let stored = order::Model {
            status: OrderStatus::Pending,
            discount: 2500,
            final_price: 0,
            user_package_id: Some("up_1".into()),
            confirmed_at: None,
            ..sample(OrderStatus::Pending)
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[item(5)]])
            .append_query_results([[held_package(3, UserPackageStatus::Active)]])
            .append_query_results([[held_package(2, UserPackageStatus::Active)]])
            .append_query_results([[stock_entry(-1, 4)]])
            .append_query_results([[item(4)]])
            .append_query_results([[stored]])
            .append_query_results([[status_entry(OrderStatus::Pending)]])
            .into_connection();

        let input = CreateOrder {
            user_package_id: Some("up_1".into()),
            ..create_input()
        };
        let (created, payment) = create(&db, "user_1", input).await.unwrap();
        assert!(payment.is_none());
        assert_eq!(created.final_price, 0);

        let log = statements(db.into_transaction_log());
        assert!(!writes_to(&log, "INSERT", "Payment"));
        let order_values = bound_values(&log, "INSERT", "Order");
        assert!(order_values.contains(&Value::BigInt(Some(0))));
        assert!(order_values.contains(&Value::BigInt(Some(2500))));
        let credit_values = bound_values(&log, "UPDATE", "UserPackage");
        assert!(credit_values.contains(&Value::Int(Some(2))));
    }

    #[tokio::test]
    async fn voucher_and_package_credit_do_not_combine() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let input = CreateOrder {
            user_package_id: Some("up_1".into()),
            user_voucher_id: Some("uv_1".into()),
            ..create_input()
        };
        let err = create(&db, "user_1", input).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn cancelling_a_package_order_refunds_the_credit_and_stock() {
        let pending = order::Model {
            discount: 2500,
            final_price: 0,
            user_package_id: Some("up_1".into()),
            confirmed_at: None,
            ..sample(OrderStatus::Pending)
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[pending.clone()]])
            .append_query_results([[held_package(0, UserPackageStatus::Exhausted)]])
            .append_query_results([[held_package(1, UserPackageStatus::Active)]])
            .append_exec_results([rows(0)])
            .append_query_results([[item(4)]])
            .append_query_results([[stock_entry(1, 5)]])
            .append_query_results([[item(5)]])
            .append_query_results([[order::Model {
                status: OrderStatus::Cancelled,
                ..pending
            }]])
            .append_query_results([[status_entry(OrderStatus::Cancelled)]])
            .append_query_results([[inbox_entry()]])
            .into_connection();

        let cancelled = cancel(&db, "user_1", false, "ord_1").await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        let log = statements(db.into_transaction_log());
        assert!(bound_values(&log, "UPDATE", "UserPackage").contains(&Value::Int(Some(1))));
        assert!(writes_to(&log, "UPDATE", "Payment"));
        assert!(bound_values(&log, "INSERT", "StockLog").contains(&Value::Int(Some(1))));
        assert!(bound_values(&log, "UPDATE", "StringItem").contains(&Value::Int(Some(5))));
        assert!(writes_to(&log, "INSERT", "OrderStatusLog"));
    }

    #[tokio::test]
    async fn cancelling_a_voucher_order_restores_voucher_and_closes_payment() {
        let pending = order::Model {
            discount: 500,
            final_price: 2000,
            user_voucher_id: Some("uv_1".into()),
            confirmed_at: None,
            ..sample(OrderStatus::Pending)
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[pending.clone()]])
            .append_query_results([[held_voucher(UserVoucherStatus::Used)]])
            .append_query_results([[held_voucher(UserVoucherStatus::Available)]])
            .append_exec_results([rows(1)])
            .append_query_results([[item(4)]])
            .append_query_results([[stock_entry(1, 5)]])
            .append_query_results([[item(5)]])
            .append_query_results([[order::Model {
                status: OrderStatus::Cancelled,
                ..pending
            }]])
            .append_query_results([[status_entry(OrderStatus::Cancelled)]])
            .append_query_results([[inbox_entry()]])
            .into_connection();

        cancel(&db, "admin_1", true, "ord_1").await.unwrap();

        let log = statements(db.into_transaction_log());
        assert!(writes_to(&log, "UPDATE", "UserVoucher"));
        let payment_values = bound_values(&log, "UPDATE", "Payment");
        assert!(payment_values.contains(&Value::from("ord_1")));
        assert!(writes_to(&log, "INSERT", "StockLog"));
    }

    #[tokio::test]
    async fn customers_cannot_cancel_someone_elses_order() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[sample(OrderStatus::Pending)]])
            .into_connection();
        let err = cancel(&db, "user_2", false, "ord_1").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn admin_status_write_cannot_cancel_past_pending() {
        for status in [
            OrderStatus::Confirmed,
            OrderStatus::InProgress,
            OrderStatus::Completed,
        ] {
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[sample(status)]])
                .into_connection();
            let err = update_status(&db, "admin_1", "ord_1", OrderStatus::Cancelled, None)
                .await
                .unwrap_err();
            assert_eq!(err.status(), StatusCode::CONFLICT);

            let log = statements(db.into_transaction_log());
            assert!(!writes_to(&log, "UPDATE", "UserPackage"));
            assert!(!writes_to(&log, "UPDATE", "Order"));
            assert!(!writes_to(&log, "INSERT", "StockLog"));
        }
    }

    #[tokio::test]
    async fn sweep_skips_orders_already_flagged() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([rows(2), rows(1), rows(0), rows(0)])
            .into_connection();

        let first = sweep_overdue(&db, 72).await.unwrap();
        assert_eq!(first.flagged_overdue, 2);
        assert_eq!(first.expired_packages, 1);
        let second = sweep_overdue(&db, 72).await.unwrap();
        assert_eq!(second.flagged_overdue, 0);
        assert_eq!(second.expired_packages, 0);

        let log = statements(db.into_transaction_log());
        let flag = log
            .iter()
            .find(|s| s.sql.starts_with("UPDATE") && s.sql.contains("\"Order\""))
            .unwrap();
        // once in SET, once in the WHERE that skips flagged rows
        assert_eq!(flag.sql.matches("\"isOverdue\"").count(), 2);
        assert!(flag.values.as_ref().unwrap().0.contains(&Value::Bool(Some(false))));
    }
}
