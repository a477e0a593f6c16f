use std::collections::{BTreeMap, HashSet};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};
use serde::Serialize;
use stringline::{
    analytics::{DailyRevenue, lifetime_value, revenue_by_day},
    loyalty::PointsStats,
};
use stringline_types::now;

use crate::{
    entity::{
        order, payment,
        sea_orm_active_enums::{OrderStatus, PaymentStatus},
        string_item,
    },
    error::ApiError,
    services::{orders, points, reviews},
};

pub const DEFAULT_REPORT_DAYS: i64 = 30;
pub const MAX_REPORT_DAYS: i64 = 365;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub orders_by_status: BTreeMap<&'static str, u64>,
    pub total_orders: u64,
    pub revenue: i64,
    pub unique_paying_users: u64,
    pub lifetime_value: f64,
    pub average_rating: Option<f64>,
    pub review_count: u64,
    pub points: PointsStats,
    pub overdue_orders: u64,
    pub low_stock_items: u64,
}

pub async fn low_stock(conn: &impl ConnectionTrait) -> Result<Vec<string_item::Model>, ApiError> {
    let items = string_item::Entity::find()
        .filter(string_item::Column::IsActive.eq(true))
        .all(conn)
        .await?;
    Ok(items
        .into_iter()
        .filter(|i| i.stock <= i.low_stock_threshold)
        .collect())
}

pub async fn dashboard(conn: &impl ConnectionTrait) -> Result<Dashboard, ApiError> {
    let statuses: Vec<OrderStatus> = order::Entity::find()
        .select_only()
        .column(order::Column::Status)
        .into_tuple()
        .all(conn)
        .await?;
    let mut orders_by_status: BTreeMap<&'static str, u64> =
        OrderStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
    for status in &statuses {
        *orders_by_status.entry(status.as_str()).or_default() += 1;
    }

    let paid: Vec<(String, i64)> = payment::Entity::find()
        .select_only()
        .column(payment::Column::UserId)
        .column(payment::Column::Amount)
        .filter(payment::Column::Status.eq(PaymentStatus::Success))
        .into_tuple()
        .all(conn)
        .await?;
    let revenue: i64 = paid.iter().map(|(_, amount)| amount).sum();
    let unique_paying_users = paid
        .iter()
        .map(|(user_id, _)| user_id.as_str())
        .collect::<HashSet<_>>()
        .len() as u64;

    let review_summary = reviews::summary(conn).await?;

    Ok(Dashboard {
        orders_by_status,
        total_orders: statuses.len() as u64,
        revenue,
        unique_paying_users,
        lifetime_value: lifetime_value(revenue, unique_paying_users),
        average_rating: review_summary.average_rating,
        review_count: review_summary.count,
        points: points::stats(conn, None).await?,
        overdue_orders: orders::overdue_count(conn).await?,
        low_stock_items: low_stock(conn).await?.len() as u64,
    })
}

/// Clamps the requested window to `1..=MAX_REPORT_DAYS`.
pub fn report_window(days: Option<i64>, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let days = days.unwrap_or(DEFAULT_REPORT_DAYS).clamp(1, MAX_REPORT_DAYS);
    (today - Duration::days(days - 1), today)
}

/// Successful payment totals per day, counted on the day they were verified.
pub async fn revenue_report(
    conn: &impl ConnectionTrait,
    days: Option<i64>,
) -> Result<Vec<DailyRevenue>, ApiError> {
    let (start, end) = report_window(days, now().date());
    let since = start.and_time(chrono::NaiveTime::MIN);

    let rows: Vec<(Option<NaiveDateTime>, NaiveDateTime, i64)> = payment::Entity::find()
        .select_only()
        .column(payment::Column::VerifiedAt)
        .column(payment::Column::CreatedAt)
        .column(payment::Column::Amount)
        .filter(payment::Column::Status.eq(PaymentStatus::Success))
        .filter(payment::Column::CreatedAt.gte(since - Duration::days(MAX_REPORT_DAYS)))
        .into_tuple()
        .all(conn)
        .await?;

    let entries = rows
        .into_iter()
        .map(|(verified_at, created_at, amount)| (verified_at.unwrap_or(created_at).date(), amount));
    Ok(revenue_by_day(entries, start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_window_is_clamped() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        assert_eq!(
            report_window(None, today),
            (NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), today)
        );
        assert_eq!(report_window(Some(1), today), (today, today));
        let (start, _) = report_window(Some(10_000), today);
        assert_eq!((today - start).num_days(), MAX_REPORT_DAYS - 1);
        assert_eq!(report_window(Some(-4), today), (today, today));
    }
}
