//! Database-backed operations shared by the route handlers. Functions that
//! take `&impl ConnectionTrait` run inside the caller's transaction.

pub mod analytics;
pub mod inventory;
pub mod notifications;
pub mod orders;
pub mod packages;
pub mod payments;
pub mod points;
pub mod referrals;
pub mod reviews;
pub mod users;
pub mod vouchers;
