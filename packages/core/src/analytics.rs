use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// Lifetime value: total revenue divided by unique paying users.
pub fn lifetime_value(total_revenue: i64, unique_users: u64) -> f64 {
    if unique_users == 0 {
        return 0.0;
    }
    total_revenue as f64 / unique_users as f64
}

pub fn average_rating(ratings: &[i32]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
    Some(sum as f64 / ratings.len() as f64)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: i64,
    pub payments: i64,
}

/// Buckets `(day, amount)` pairs into one entry per day of `[start, end]`,
/// zero-filling days without payments.
pub fn revenue_by_day<I>(entries: I, start: NaiveDate, end: NaiveDate) -> Vec<DailyRevenue>
where
    I: IntoIterator<Item = (NaiveDate, i64)>,
{
    let mut buckets: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
    for (date, amount) in entries {
        if date < start || date > end {
            continue;
        }
        let bucket = buckets.entry(date).or_default();
        bucket.0 += amount;
        bucket.1 += 1;
    }

    let mut out = Vec::new();
    let mut day = start;
    while day <= end {
        let (revenue, payments) = buckets.get(&day).copied().unwrap_or_default();
        out.push(DailyRevenue {
            date: day,
            revenue,
            payments,
        });
        day += Duration::days(1);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[test]
    fn ltv_divides_by_unique_users() {
        assert_eq!(lifetime_value(90_000, 3), 30_000.0);
        assert_eq!(lifetime_value(10_000, 4), 2_500.0);
        assert_eq!(lifetime_value(5_000, 0), 0.0);
    }

    #[test]
    fn average_ratings() {
        assert_eq!(average_rating(&[]), None);
        assert_eq!(average_rating(&[5, 4, 3]), Some(4.0));
    }

    #[test]
    fn groups_and_zero_fills_days() {
        let series = revenue_by_day(
            vec![(d(2), 1000), (d(2), 500), (d(4), 2500), (d(9), 100)],
            d(1),
            d(4),
        );
        assert_eq!(series.len(), 4);
        assert_eq!(series[0].revenue, 0);
        assert_eq!(series[1].revenue, 1500);
        assert_eq!(series[1].payments, 2);
        assert_eq!(series[2].revenue, 0);
        assert_eq!(series[3].revenue, 2500);
    }
}
