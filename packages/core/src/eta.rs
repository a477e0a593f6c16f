use chrono::{Duration, NaiveDateTime};

/// Admin overrides win; otherwise confirmed orders are due `turnaround_hours`
/// after confirmation. Orders that never got confirmed have no ETA.
pub fn effective_eta(
    confirmed_at: Option<NaiveDateTime>,
    turnaround_hours: i64,
    override_at: Option<NaiveDateTime>,
) -> Option<NaiveDateTime> {
    override_at.or_else(|| confirmed_at.map(|at| at + Duration::hours(turnaround_hours)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 2, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn computed_from_confirmation() {
        assert_eq!(effective_eta(Some(at(1, 9)), 48, None), Some(at(3, 9)));
    }

    #[test]
    fn override_wins() {
        assert_eq!(
            effective_eta(Some(at(1, 9)), 48, Some(at(2, 18))),
            Some(at(2, 18))
        );
        assert_eq!(effective_eta(None, 48, Some(at(2, 18))), Some(at(2, 18)));
    }

    #[test]
    fn unconfirmed_orders_have_none() {
        assert_eq!(effective_eta(None, 48, None), None);
    }
}
