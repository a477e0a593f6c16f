//! Order status set and the predicates the order service guards writes with.

use chrono::{Duration, NaiveDateTime};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

pub const MIN_TENSION_LBS: i32 = 15;
pub const MAX_TENSION_LBS: i32 = 35;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "picked_up")]
    PickedUp,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::InProgress,
        OrderStatus::Completed,
        OrderStatus::PickedUp,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::PickedUp => "picked_up",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Awaiting payment",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::InProgress => "Stringing in progress",
            OrderStatus::Completed => "Ready for pickup",
            OrderStatus::PickedUp => "Picked up",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::PickedUp | OrderStatus::Cancelled)
    }

    /// Statuses that count as a fulfilled order for eligibility and referrals.
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::PickedUp)
    }

    /// Statuses the automation sweep watches for overdue work.
    pub fn is_in_workshop(&self) -> bool {
        matches!(self, OrderStatus::Confirmed | OrderStatus::InProgress)
    }

    pub fn ensure_cancellable(&self) -> Result<(), DomainError> {
        if *self == OrderStatus::Pending {
            Ok(())
        } else {
            Err(DomainError::NotCancellable(self.as_str().to_string()))
        }
    }

    /// Admin updates may move freely between statuses except out of a
    /// terminal one. Cancelling is only possible while pending.
    pub fn ensure_can_move_to(&self, next: OrderStatus) -> Result<(), DomainError> {
        if self.is_terminal() && *self != next {
            return Err(DomainError::TerminalStatus(self.as_str().to_string()));
        }
        if next == OrderStatus::Cancelled && *self != next {
            self.ensure_cancellable()?;
        }
        Ok(())
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown order status '{}'", s))
    }
}

pub fn validate_tension(value: i32) -> Result<(), DomainError> {
    if (MIN_TENSION_LBS..=MAX_TENSION_LBS).contains(&value) {
        Ok(())
    } else {
        Err(DomainError::TensionOutOfRange {
            value,
            min: MIN_TENSION_LBS,
            max: MAX_TENSION_LBS,
        })
    }
}

/// True when an order has sat in the workshop longer than `overdue_hours`.
pub fn is_overdue(
    status: OrderStatus,
    status_changed_at: NaiveDateTime,
    now: NaiveDateTime,
    overdue_hours: i64,
) -> bool {
    status.is_in_workshop() && now - status_changed_at > Duration::hours(overdue_hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn every_status_has_a_label() {
        for status in OrderStatus::ALL {
            assert!(!status.label().is_empty());
        }
        assert_eq!(OrderStatus::Completed.label(), "Ready for pickup");
    }

    #[test]
    fn parses_its_own_wire_names() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&OrderStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn only_pending_orders_cancel() {
        assert!(OrderStatus::Pending.ensure_cancellable().is_ok());
        for status in [OrderStatus::Confirmed, OrderStatus::Completed, OrderStatus::Cancelled] {
            let err = status.ensure_cancellable().unwrap_err();
            assert!(err.is_conflict());
        }
    }

    #[test]
    fn terminal_statuses_are_sticky() {
        assert!(OrderStatus::Completed.ensure_can_move_to(OrderStatus::InProgress).is_ok());
        assert!(OrderStatus::Cancelled.ensure_can_move_to(OrderStatus::Confirmed).is_err());
        assert!(OrderStatus::PickedUp.ensure_can_move_to(OrderStatus::Completed).is_err());
        assert!(OrderStatus::PickedUp.ensure_can_move_to(OrderStatus::PickedUp).is_ok());
    }

    #[test]
    fn status_writes_cancel_only_pending_orders() {
        assert!(OrderStatus::Pending.ensure_can_move_to(OrderStatus::Cancelled).is_ok());
        for status in [
            OrderStatus::Confirmed,
            OrderStatus::InProgress,
            OrderStatus::Completed,
            OrderStatus::PickedUp,
        ] {
            let err = status.ensure_can_move_to(OrderStatus::Cancelled).unwrap_err();
            assert!(err.is_conflict(), "{} -> cancelled must conflict", status);
        }
    }

    #[test]
    fn tension_bounds() {
        assert!(validate_tension(24).is_ok());
        assert!(validate_tension(15).is_ok());
        assert!(validate_tension(35).is_ok());
        assert!(validate_tension(14).is_err());
        assert!(validate_tension(40).is_err());
    }

    #[test]
    fn overdue_after_threshold() {
        let changed = at(1, 10);
        assert!(!is_overdue(OrderStatus::InProgress, changed, at(4, 10), 72));
        assert!(is_overdue(OrderStatus::InProgress, changed, at(4, 11), 72));
        assert!(is_overdue(OrderStatus::Confirmed, changed, at(5, 0), 72));
    }

    #[test]
    fn overdue_ignores_orders_outside_the_workshop() {
        let changed = at(1, 10);
        assert!(!is_overdue(OrderStatus::Pending, changed, at(20, 0), 72));
        assert!(!is_overdue(OrderStatus::Completed, changed, at(20, 0), 72));
    }
}
