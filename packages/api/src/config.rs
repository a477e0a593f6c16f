//! Business settings shared by the services. Populated by the binary from env.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    /// Hours an order may sit in the workshop before the sweep flags it
    pub overdue_hours: i64,
    /// Days before expiry in which a package renewal is discounted
    pub renewal_window_days: i64,
    pub renewal_discount_percent: i64,
    /// System ETA offset from confirmation
    pub turnaround_hours: i64,
    pub max_upload_bytes: usize,
    /// Lifetime of issued session tokens
    pub session_ttl_hours: i64,
    /// Webhook is disabled when unset
    pub gateway_secret: Option<String>,
    /// Cron endpoint is disabled when unset
    pub cron_secret: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            overdue_hours: 72,
            renewal_window_days: 7,
            renewal_discount_percent: 10,
            turnaround_hours: 48,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            session_ttl_hours: 24 * 7,
            gateway_secret: None,
            cron_secret: None,
        }
    }
}
