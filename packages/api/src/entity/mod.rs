//! `SeaORM` entities for the stringing service schema.

pub mod prelude;

pub mod error_report;
pub mod gateway_event;
pub mod notification;
pub mod order;
pub mod order_status_log;
pub mod package;
pub mod payment;
pub mod points_log;
pub mod referral_log;
pub mod review;
pub mod sea_orm_active_enums;
pub mod stock_log;
pub mod string_item;
pub mod user;
pub mod user_package;
pub mod user_voucher;
pub mod voucher;
