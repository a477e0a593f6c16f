use serde::{Deserialize, Serialize};

pub mod admin;
pub mod cron;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod packages;
pub mod payments;
pub mod points;
pub mod profile;
pub mod referrals;
pub mod reviews;
pub mod strings;
pub mod vouchers;
pub mod webhook;

#[derive(Clone, Deserialize, Serialize, Debug, Default)]
pub struct PaginationParams {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl PaginationParams {
    pub fn bounds(&self) -> (u64, u64) {
        stringline_types::utils::page_bounds(self.limit, self.offset)
    }
}
