use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

pub mod analytics;
pub mod inventory;
pub mod orders;
pub mod packages;
pub mod payments;
pub mod users;
pub mod vouchers;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(orders::list_orders))
        .route("/orders/{order_id}/status", patch(orders::update_status))
        .route("/orders/{order_id}/eta", patch(orders::set_eta))
        .route("/automation/run", post(orders::run_automation))
        .route("/payments/pending", get(payments::pending_payments))
        .route("/payments/{payment_id}/verify", post(payments::verify_payment))
        .route("/payments/{payment_id}/reject", post(payments::reject_payment))
        .route(
            "/inventory",
            get(inventory::list_items).post(inventory::create_item),
        )
        .route("/inventory/low-stock", get(inventory::low_stock))
        .route("/inventory/{item_id}", patch(inventory::update_item))
        .route("/inventory/{item_id}/adjust", post(inventory::adjust_stock))
        .route("/inventory/{item_id}/logs", get(inventory::stock_logs))
        .route(
            "/vouchers",
            get(vouchers::list_vouchers).post(vouchers::create_voucher),
        )
        .route(
            "/vouchers/{voucher_id}",
            patch(vouchers::update_voucher).delete(vouchers::delete_voucher),
        )
        .route(
            "/packages",
            get(packages::list_packages).post(packages::create_package),
        )
        .route(
            "/packages/{package_id}",
            patch(packages::update_package).delete(packages::delete_package),
        )
        .route("/analytics/dashboard", get(analytics::dashboard))
        .route("/analytics/revenue", get(analytics::revenue))
        .route("/users", get(users::list_users))
        .route("/users/{user_id}/role", patch(users::set_role))
}
