pub use super::error_report::Entity as ErrorReport;
pub use super::gateway_event::Entity as GatewayEvent;
pub use super::notification::Entity as Notification;
pub use super::order::Entity as Order;
pub use super::order_status_log::Entity as OrderStatusLog;
pub use super::package::Entity as Package;
pub use super::payment::Entity as Payment;
pub use super::points_log::Entity as PointsLog;
pub use super::referral_log::Entity as ReferralLog;
pub use super::review::Entity as Review;
pub use super::stock_log::Entity as StockLog;
pub use super::string_item::Entity as StringItem;
pub use super::user::Entity as User;
pub use super::user_package::Entity as UserPackage;
pub use super::user_voucher::Entity as UserVoucher;
pub use super::voucher::Entity as Voucher;
