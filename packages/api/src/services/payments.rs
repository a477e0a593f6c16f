use bytes::Bytes;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use stringline_types::{create_id, now};

use crate::{
    entity::{
        gateway_event, order, payment,
        sea_orm_active_enums::{OrderStatus, PaymentProvider, PaymentStatus, UserPackageStatus},
        user_package,
    },
    error::ApiError,
    services::{notifications, orders, packages, users},
    storage::{ProofStore, validate_proof},
};

const SIGNATURE_CONTEXT: &str = "stringline 2025-01-01 payment gateway webhook v1";

pub enum PaymentTarget {
    Order(String),
    Package(String),
}

pub async fn find_payment(conn: &impl ConnectionTrait, id: &str) -> Result<payment::Model, ApiError> {
    payment::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Payment {} not found", id)))
}

/// Reads the payment with a row lock, so concurrent settlements of the same
/// payment run one after the other and the later one sees the final status.
pub async fn lock_payment(conn: &impl ConnectionTrait, id: &str) -> Result<payment::Model, ApiError> {
    payment::Entity::find_by_id(id)
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Payment {} not found", id)))
}

pub async fn find_owned(
    conn: &impl ConnectionTrait,
    user_id: &str,
    id: &str,
) -> Result<payment::Model, ApiError> {
    let found = find_payment(conn, id).await?;
    if found.user_id != user_id {
        return Err(ApiError::not_found(format!("Payment {} not found", id)));
    }
    Ok(found)
}

pub async fn insert_pending(
    conn: &impl ConnectionTrait,
    user_id: &str,
    target: PaymentTarget,
    amount: i64,
    provider: PaymentProvider,
) -> Result<payment::Model, ApiError> {
    let (order_id, user_package_id) = match target {
        PaymentTarget::Order(id) => (Some(id), None),
        PaymentTarget::Package(id) => (None, Some(id)),
    };
    let now = now();
    let created = payment::ActiveModel {
        id: Set(create_id()),
        user_id: Set(user_id.to_string()),
        order_id: Set(order_id),
        user_package_id: Set(user_package_id),
        amount: Set(amount),
        provider: Set(provider),
        status: Set(PaymentStatus::Pending),
        proof_url: Set(None),
        external_ref: Set(None),
        reject_reason: Set(None),
        verified_by: Set(None),
        verified_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?;
    tracing::info!(payment_id = %created.id, amount, "Payment created");
    Ok(created)
}

/// Cancels whatever is still pending for an order. Returns how many.
pub async fn cancel_pending_for_order(
    conn: &impl ConnectionTrait,
    order_id: &str,
) -> Result<u64, ApiError> {
    let result = payment::Entity::update_many()
        .col_expr(
            payment::Column::Status,
            sea_orm::sea_query::Expr::value(PaymentStatus::Cancelled),
        )
        .col_expr(payment::Column::UpdatedAt, sea_orm::sea_query::Expr::value(now()))
        .filter(payment::Column::OrderId.eq(order_id))
        .filter(payment::Column::Status.eq(PaymentStatus::Pending))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayment {
    pub order_id: Option<String>,
    pub user_package_id: Option<String>,
    pub provider: Option<PaymentProvider>,
}

/// Opens a payment for an unpaid order or package of the caller.
pub async fn create_intent(
    db: &DatabaseConnection,
    user_id: &str,
    input: CreatePayment,
) -> Result<payment::Model, ApiError> {
    let provider = input.provider.unwrap_or(PaymentProvider::Manual);
    let txn = db.begin().await?;

    let (target, amount) = match (input.order_id, input.user_package_id) {
        (Some(order_id), None) => {
            let found = orders::find_owned(&txn, user_id, &order_id).await?;
            if found.status != OrderStatus::Pending {
                return Err(ApiError::conflict("Order is not awaiting payment"));
            }
            let open = payment::Entity::find()
                .filter(payment::Column::OrderId.eq(&found.id))
                .filter(payment::Column::Status.eq(PaymentStatus::Pending))
                .count(&txn)
                .await?;
            if open > 0 {
                return Err(ApiError::conflict("Order already has a pending payment"));
            }
            if found.final_price <= 0 {
                return Err(ApiError::bad_request("Order has nothing to pay"));
            }
            (PaymentTarget::Order(found.id), found.final_price)
        }
        (None, Some(user_package_id)) => {
            let owned = user_package::Entity::find_by_id(&user_package_id)
                .one(&txn)
                .await?
                .filter(|p| p.user_id == user_id)
                .ok_or_else(|| ApiError::not_found(format!("Package {} not found", user_package_id)))?;
            if owned.status != UserPackageStatus::PendingPayment {
                return Err(ApiError::conflict("Package is not awaiting payment"));
            }
            let open = payment::Entity::find()
                .filter(payment::Column::UserPackageId.eq(&owned.id))
                .filter(payment::Column::Status.eq(PaymentStatus::Pending))
                .count(&txn)
                .await?;
            if open > 0 {
                return Err(ApiError::conflict("Package already has a pending payment"));
            }
            (PaymentTarget::Package(owned.id), owned.price_paid)
        }
        _ => {
            return Err(ApiError::bad_request(
                "Provide exactly one of orderId or userPackageId",
            ));
        }
    };

    let created = insert_pending(&txn, user_id, target, amount, provider).await?;
    txn.commit().await?;
    Ok(created)
}

pub async fn attach_proof(
    db: &DatabaseConnection,
    proofs: &ProofStore,
    user_id: &str,
    payment_id: &str,
    content_type: Option<&str>,
    data: Bytes,
    max_bytes: usize,
) -> Result<payment::Model, ApiError> {
    let found = find_owned(db, user_id, payment_id).await?;
    if found.status != PaymentStatus::Pending {
        return Err(ApiError::conflict("Payment is no longer pending"));
    }

    let extension = validate_proof(content_type, &data, max_bytes)?;
    let size = data.len();
    let key = proofs.put_proof(&found.id, extension, data).await?;

    let mut active: payment::ActiveModel = found.into();
    active.proof_url = Set(Some(key));
    active.updated_at = Set(now());
    let updated = active.update(db).await?;

    for admin_id in users::admin_ids(db).await? {
        notifications::notify(
            db,
            &admin_id,
            "Payment proof uploaded",
            format!(
                "Payment {} of {} is waiting for verification.",
                updated.id,
                stringline_types::utils::format_cents(updated.amount)
            ),
        )
        .await?;
    }
    tracing::info!(payment_id = %updated.id, size, "Payment proof uploaded");
    Ok(updated)
}

/// Marks a pending payment as paid and releases what it paid for.
pub async fn settle_success(
    conn: &impl ConnectionTrait,
    found: payment::Model,
    verified_by: Option<&str>,
    external_ref: Option<String>,
) -> Result<payment::Model, ApiError> {
    if found.status != PaymentStatus::Pending {
        return Err(ApiError::conflict(format!(
            "Payment {} is not pending",
            found.id
        )));
    }

    let now = now();
    let order_id = found.order_id.clone();
    let user_package_id = found.user_package_id.clone();
    let mut active: payment::ActiveModel = found.into();
    active.status = Set(PaymentStatus::Success);
    active.verified_by = Set(verified_by.map(str::to_string));
    active.verified_at = Set(Some(now));
    if external_ref.is_some() {
        active.external_ref = Set(external_ref);
    }
    active.updated_at = Set(now);
    let paid = active.update(conn).await?;

    if let Some(order_id) = order_id {
        let found = orders::find_order(conn, &order_id).await?;
        match found.status {
            OrderStatus::Pending => {
                orders::transition(
                    conn,
                    found,
                    OrderStatus::Confirmed,
                    Some("Payment verified".to_string()),
                    verified_by,
                )
                .await?;
            }
            OrderStatus::Cancelled => {
                return Err(ApiError::conflict(format!(
                    "Order {} was cancelled",
                    order_id
                )));
            }
            status => {
                tracing::info!(order_id, status = %status, "Order already moved on, payment settled only");
            }
        }
    } else if let Some(user_package_id) = user_package_id {
        packages::activate(conn, &user_package_id).await?;
    }

    tracing::info!(payment_id = %paid.id, amount = paid.amount, "Payment verified");
    Ok(paid)
}

pub async fn settle_rejected(
    conn: &impl ConnectionTrait,
    found: payment::Model,
    verified_by: Option<&str>,
    reason: &str,
) -> Result<payment::Model, ApiError> {
    if found.status != PaymentStatus::Pending {
        return Err(ApiError::conflict(format!(
            "Payment {} is not pending",
            found.id
        )));
    }

    let now = now();
    let mut active: payment::ActiveModel = found.into();
    active.status = Set(PaymentStatus::Rejected);
    active.reject_reason = Set(Some(reason.to_string()));
    active.verified_by = Set(verified_by.map(str::to_string));
    active.verified_at = Set(Some(now));
    active.updated_at = Set(now);
    let rejected = active.update(conn).await?;

    notifications::notify(
        conn,
        &rejected.user_id,
        "Payment rejected",
        format!("Your payment was rejected: {}. Please pay again.", reason),
    )
    .await?;
    tracing::info!(payment_id = %rejected.id, reason, "Payment rejected");
    Ok(rejected)
}

pub async fn verify(
    db: &DatabaseConnection,
    admin_id: &str,
    payment_id: &str,
) -> Result<payment::Model, ApiError> {
    let txn = db.begin().await?;
    let found = lock_payment(&txn, payment_id).await?;
    let paid = settle_success(&txn, found, Some(admin_id), None).await?;
    txn.commit().await?;
    Ok(paid)
}

pub async fn reject(
    db: &DatabaseConnection,
    admin_id: &str,
    payment_id: &str,
    reason: &str,
) -> Result<payment::Model, ApiError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(ApiError::bad_request("A rejection reason is required"));
    }
    let txn = db.begin().await?;
    let found = lock_payment(&txn, payment_id).await?;
    let rejected = settle_rejected(&txn, found, Some(admin_id), reason).await?;
    txn.commit().await?;
    Ok(rejected)
}

pub async fn list_for_user(
    conn: &impl ConnectionTrait,
    user_id: &str,
    limit: u64,
    offset: u64,
) -> Result<(Vec<payment::Model>, u64), ApiError> {
    let query = payment::Entity::find().filter(payment::Column::UserId.eq(user_id));
    let total = query.clone().count(conn).await?;
    let items = query
        .order_by_desc(payment::Column::CreatedAt)
        .limit(limit)
        .offset(offset)
        .all(conn)
        .await?;
    Ok((items, total))
}

/// Pending payments oldest first, joined with their order when there is one.
pub async fn pending_queue(
    conn: &impl ConnectionTrait,
    limit: u64,
    offset: u64,
) -> Result<(Vec<(payment::Model, Option<order::Model>)>, u64), ApiError> {
    let query = payment::Entity::find().filter(payment::Column::Status.eq(PaymentStatus::Pending));
    let total = query.clone().count(conn).await?;
    let items = query
        .find_also_related(order::Entity)
        .order_by_asc(payment::Column::CreatedAt)
        .limit(limit)
        .offset(offset)
        .all(conn)
        .await?;
    Ok((items, total))
}

/// Hex keyed hash the gateway sends in `x-gateway-signature`.
pub fn gateway_signature(secret: &str, body: &[u8]) -> String {
    let key = blake3::derive_key(SIGNATURE_CONTEXT, secret.as_bytes());
    blake3::keyed_hash(&key, body).to_hex().to_string()
}

pub fn verify_gateway_signature(
    secret: &str,
    body: &[u8],
    signature: Option<&str>,
) -> Result<(), ApiError> {
    let signature = signature
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Missing gateway signature"))?;
    let provided = blake3::Hash::from_hex(signature)
        .map_err(|_| ApiError::unauthorized("Malformed gateway signature"))?;
    let key = blake3::derive_key(SIGNATURE_CONTEXT, secret.as_bytes());
    // Hash equality is constant time
    if blake3::keyed_hash(&key, body) != provided {
        return Err(ApiError::unauthorized("Invalid gateway signature"));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayCallback {
    pub event_id: String,
    pub payment_id: String,
    pub external_ref: Option<String>,
    pub status: GatewayStatus,
    pub amount: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GatewayOutcome {
    Processed,
    Duplicate,
}

/// Applies a signed gateway callback once per event id. The event row is
/// written before the payment is settled; a concurrent delivery of the same
/// event fails on its primary key and is reported as a duplicate.
pub async fn handle_gateway_callback(
    db: &DatabaseConnection,
    callback: GatewayCallback,
) -> Result<GatewayOutcome, ApiError> {
    let txn = db.begin().await?;
    if gateway_event::Entity::find_by_id(&callback.event_id)
        .one(&txn)
        .await?
        .is_some()
    {
        tracing::info!(event_id = %callback.event_id, "Duplicate gateway event ignored");
        return Ok(GatewayOutcome::Duplicate);
    }

    let found = lock_payment(&txn, &callback.payment_id).await?;
    if found.amount != callback.amount {
        return Err(ApiError::bad_request(format!(
            "Amount mismatch for payment {}: expected {}, got {}",
            found.id, found.amount, callback.amount
        )));
    }

    let outcome = match callback.status {
        GatewayStatus::Success => "success",
        GatewayStatus::Failed => "failed",
    };
    let claimed = gateway_event::ActiveModel {
        id: Set(callback.event_id.clone()),
        payment_id: Set(callback.payment_id.clone()),
        outcome: Set(outcome.to_string()),
        processed_at: Set(now()),
    }
    .insert(&txn)
    .await;
    match claimed {
        Ok(_) => {}
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            tracing::info!(event_id = %callback.event_id, "Concurrent duplicate gateway event ignored");
            return Ok(GatewayOutcome::Duplicate);
        }
        Err(err) => return Err(err.into()),
    }

    match callback.status {
        GatewayStatus::Success => {
            settle_success(&txn, found, None, callback.external_ref.clone()).await?;
        }
        GatewayStatus::Failed => {
            settle_rejected(&txn, found, None, "Declined by payment gateway").await?;
        }
    }
    txn.commit().await?;

    tracing::info!(event_id = %callback.event_id, payment_id = %callback.payment_id, outcome, "Gateway event processed");
    Ok(GatewayOutcome::Processed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{notification, order_status_log};
    use axum::http::StatusCode;
    use chrono::{NaiveDate, NaiveDateTime};
    use sea_orm::{DatabaseBackend, MockDatabase, Statement, Transaction};

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 4, 2)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap()
    }

    fn order_payment(status: PaymentStatus) -> payment::Model {
        payment::Model {
            id: "pay_1".into(),
            user_id: "user_1".into(),
            order_id: Some("ord_1".into()),
            user_package_id: None,
            amount: 2500,
            provider: PaymentProvider::Gateway,
            status,
            proof_url: None,
            external_ref: None,
            reject_reason: None,
            verified_by: None,
            verified_at: None,
            created_at: at(),
            updated_at: at(),
        }
    }

    fn order_in(status: OrderStatus) -> order::Model {
        order::Model {
            id: "ord_1".into(),
            user_id: "user_1".into(),
            string_item_id: "str_1".into(),
            tension_main: 25,
            tension_cross: 25,
            racket_brand: None,
            racket_model: None,
            notes: None,
            status,
            price: 2500,
            discount: 0,
            final_price: 2500,
            user_package_id: None,
            user_voucher_id: None,
            is_overdue: false,
            status_changed_at: at(),
            confirmed_at: None,
            eta_override: None,
            completed_at: None,
            points_awarded: false,
            created_at: at(),
            updated_at: at(),
        }
    }

    fn status_entry() -> order_status_log::Model {
        order_status_log::Model {
            id: "osl_1".into(),
            order_id: "ord_1".into(),
            from_status: Some(OrderStatus::Pending),
            to_status: OrderStatus::Confirmed,
            note: None,
            actor_id: None,
            created_at: at(),
        }
    }

    fn inbox_entry() -> notification::Model {
        notification::Model {
            id: "n_1".into(),
            user_id: "user_1".into(),
            title: "Order Confirmed".into(),
            body: "Your order is now: Confirmed.".into(),
            read: false,
            read_at: None,
            created_at: at(),
        }
    }

    fn callback(amount: i64) -> GatewayCallback {
        GatewayCallback {
            event_id: "evt_1".into(),
            payment_id: "pay_1".into(),
            external_ref: Some("tx_1".into()),
            status: GatewayStatus::Success,
            amount,
        }
    }

    fn statements(log: Vec<Transaction>) -> Vec<Statement> {
        log.iter().flat_map(|t| t.statements().to_vec()).collect()
    }

    fn writes_to(statements: &[Statement], verb: &str, table: &str) -> bool {
        let table = format!("\"{}\"", table);
        statements
            .iter()
            .any(|s| s.sql.starts_with(verb) && s.sql.contains(&table))
    }

    #[tokio::test]
    async fn verifying_confirms_the_pending_order() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[order_payment(PaymentStatus::Pending)]])
            .append_query_results([[order_payment(PaymentStatus::Success)]])
            .append_query_results([[order_in(OrderStatus::Pending)]])
            .append_query_results([[order_in(OrderStatus::Confirmed)]])
            .append_query_results([[status_entry()]])
            .append_query_results([[inbox_entry()]])
            .into_connection();

        let paid = verify(&db, "admin_1", "pay_1").await.unwrap();
        assert_eq!(paid.status, PaymentStatus::Success);

        let log = statements(db.into_transaction_log());
        assert!(log[1].sql.contains("FOR UPDATE"));
        assert!(writes_to(&log, "UPDATE", "Payment"));
        assert!(writes_to(&log, "UPDATE", "Order"));
        assert!(writes_to(&log, "INSERT", "OrderStatusLog"));
        assert_eq!(log.last().unwrap().sql, "COMMIT");
    }

    #[tokio::test]
    async fn second_verification_is_a_conflict() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[order_payment(PaymentStatus::Success)]])
            .into_connection();

        let err = verify(&db, "admin_1", "pay_1").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let log = statements(db.into_transaction_log());
        assert!(!writes_to(&log, "UPDATE", "Payment"));
        assert!(!writes_to(&log, "UPDATE", "Order"));
    }

    #[tokio::test]
    async fn verifying_after_the_order_moved_on_settles_the_payment_only() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[order_payment(PaymentStatus::Pending)]])
            .append_query_results([[order_payment(PaymentStatus::Success)]])
            .append_query_results([[order_in(OrderStatus::InProgress)]])
            .into_connection();

        let paid = verify(&db, "admin_1", "pay_1").await.unwrap();
        assert_eq!(paid.status, PaymentStatus::Success);

        let log = statements(db.into_transaction_log());
        assert!(writes_to(&log, "UPDATE", "Payment"));
        assert!(!writes_to(&log, "UPDATE", "Order"));
        assert_eq!(log.last().unwrap().sql, "COMMIT");
    }

    #[tokio::test]
    async fn rejection_needs_a_reason() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = reject(&db, "admin_1", "pay_1", "   ").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn repeated_gateway_event_is_a_no_op() {
        let seen = gateway_event::Model {
            id: "evt_1".into(),
            payment_id: "pay_1".into(),
            outcome: "success".into(),
            processed_at: at(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[seen]])
            .into_connection();

        let outcome = handle_gateway_callback(&db, callback(2500)).await.unwrap();
        assert_eq!(outcome, GatewayOutcome::Duplicate);

        let log = statements(db.into_transaction_log());
        assert!(!writes_to(&log, "UPDATE", "Payment"));
        assert!(!writes_to(&log, "INSERT", "GatewayEvent"));
    }

    #[tokio::test]
    async fn gateway_amount_mismatch_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<gateway_event::Model>::new()])
            .append_query_results([[order_payment(PaymentStatus::Pending)]])
            .into_connection();

        let err = handle_gateway_callback(&db, callback(1200)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let log = statements(db.into_transaction_log());
        assert!(!writes_to(&log, "UPDATE", "Payment"));
        assert!(!writes_to(&log, "INSERT", "GatewayEvent"));
        assert_eq!(log.last().unwrap().sql, "ROLLBACK");
    }

    #[tokio::test]
    async fn gateway_success_claims_the_event_before_settling() {
        let claimed = gateway_event::Model {
            id: "evt_1".into(),
            payment_id: "pay_1".into(),
            outcome: "success".into(),
            processed_at: at(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<gateway_event::Model>::new()])
            .append_query_results([[order_payment(PaymentStatus::Pending)]])
            .append_query_results([[claimed]])
            .append_query_results([[order_payment(PaymentStatus::Success)]])
            .append_query_results([[order_in(OrderStatus::Pending)]])
            .append_query_results([[order_in(OrderStatus::Confirmed)]])
            .append_query_results([[status_entry()]])
            .append_query_results([[inbox_entry()]])
            .into_connection();

        let outcome = handle_gateway_callback(&db, callback(2500)).await.unwrap();
        assert_eq!(outcome, GatewayOutcome::Processed);

        let log = statements(db.into_transaction_log());
        let position = |verb: &str, table: &str| {
            let table = format!("\"{}\"", table);
            log.iter()
                .position(|s| s.sql.starts_with(verb) && s.sql.contains(&table))
                .unwrap()
        };
        assert!(position("INSERT", "GatewayEvent") < position("UPDATE", "Payment"));
    }

    #[test]
    fn accepts_own_signature() {
        let body = br#"{"eventId":"evt_1","paymentId":"pay_1","status":"success","amount":2500}"#;
        let signature = gateway_signature("gw-secret", body);
        assert_eq!(signature.len(), 64);
        assert!(verify_gateway_signature("gw-secret", body, Some(&signature)).is_ok());
    }

    #[test]
    fn rejects_tampered_or_missing_signatures() {
        let body = b"{\"amount\":2500}";
        let signature = gateway_signature("gw-secret", body);

        let err = verify_gateway_signature("gw-secret", b"{\"amount\":1}", Some(&signature))
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);

        assert!(verify_gateway_signature("other-secret", body, Some(&signature)).is_err());
        assert!(verify_gateway_signature("gw-secret", body, None).is_err());
        assert!(verify_gateway_signature("gw-secret", body, Some("zz")).is_err());
    }

    #[test]
    fn parses_callback_body() {
        let callback: GatewayCallback = serde_json::from_str(
            r#"{"eventId":"evt_1","paymentId":"pay_1","externalRef":"tx_9","status":"failed","amount":1200}"#,
        )
        .unwrap();
        assert_eq!(callback.status, GatewayStatus::Failed);
        assert_eq!(callback.external_ref.as_deref(), Some("tx_9"));
    }
}
