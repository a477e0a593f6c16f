//! Voucher discount math and package eligibility rules.

use chrono::{Duration, NaiveDateTime};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    #[sea_orm(string_value = "FIXED")]
    Fixed,
    #[sea_orm(string_value = "PERCENTAGE")]
    Percentage,
}

impl std::str::FromStr for DiscountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" | "fixed_amount" => Ok(DiscountType::Fixed),
            "percentage" | "percent" => Ok(DiscountType::Percentage),
            other => Err(format!(
                "discount type must be 'fixed' or 'percentage', got '{}'",
                other
            )),
        }
    }
}

/// The parts of a voucher that decide how much it takes off a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoucherTerms {
    pub discount_type: DiscountType,
    /// Cents for `Fixed`, whole percent for `Percentage`.
    pub value: i64,
    pub min_spend: i64,
    pub max_discount: Option<i64>,
}

impl VoucherTerms {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.value < 0 {
            return Err(DomainError::Negative("voucher value"));
        }
        if self.min_spend < 0 {
            return Err(DomainError::Negative("minimum spend"));
        }
        if let Some(max) = self.max_discount
            && max < 0
        {
            return Err(DomainError::Negative("maximum discount"));
        }
        if self.discount_type == DiscountType::Percentage && self.value > 100 {
            return Err(DomainError::InvalidPercentage);
        }
        Ok(())
    }

    /// Discount in cents for a list price. Never exceeds the price.
    pub fn discount_for(&self, price: i64) -> Result<i64, DomainError> {
        if price < self.min_spend {
            return Err(DomainError::MinSpendNotReached {
                min_spend: self.min_spend,
            });
        }

        let raw = match self.discount_type {
            DiscountType::Fixed => self.value,
            DiscountType::Percentage => price * self.value / 100,
        };
        let capped = match self.max_discount {
            Some(max) => raw.min(max),
            None => raw,
        };
        Ok(capped.clamp(0, price))
    }
}

/// First-order-only offers need a customer without fulfilled orders.
pub fn first_order_eligible(first_order_only: bool, fulfilled_orders: u64) -> bool {
    !first_order_only || fulfilled_orders == 0
}

pub fn ensure_first_order_eligible(
    first_order_only: bool,
    fulfilled_orders: u64,
) -> Result<(), DomainError> {
    if first_order_eligible(first_order_only, fulfilled_orders) {
        Ok(())
    } else {
        Err(DomainError::FirstOrderOnly)
    }
}

/// Renewal pricing applies while the current package expires within the window.
pub fn renewal_discount_applies(
    current_expiry: Option<NaiveDateTime>,
    now: NaiveDateTime,
    window_days: i64,
) -> bool {
    match current_expiry {
        Some(expiry) => expiry >= now && expiry - now <= Duration::days(window_days),
        None => false,
    }
}

pub fn apply_percent_off(price: i64, percent: i64) -> i64 {
    let percent = percent.clamp(0, 100);
    price - price * percent / 100
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn fixed(value: i64) -> VoucherTerms {
        VoucherTerms {
            discount_type: DiscountType::Fixed,
            value,
            min_spend: 0,
            max_discount: None,
        }
    }

    #[test]
    fn fixed_discount_never_exceeds_price() {
        assert_eq!(fixed(500).discount_for(2800).unwrap(), 500);
        assert_eq!(fixed(5000).discount_for(2800).unwrap(), 2800);
    }

    #[test]
    fn percentage_discount_is_floored_and_capped() {
        let terms = VoucherTerms {
            discount_type: DiscountType::Percentage,
            value: 15,
            min_spend: 0,
            max_discount: Some(300),
        };
        assert_eq!(terms.discount_for(1999).unwrap(), 299);
        assert_eq!(terms.discount_for(4000).unwrap(), 300);
    }

    #[test]
    fn min_spend_is_enforced() {
        let terms = VoucherTerms {
            min_spend: 3000,
            ..fixed(500)
        };
        assert_eq!(
            terms.discount_for(2999),
            Err(DomainError::MinSpendNotReached { min_spend: 3000 })
        );
        assert_eq!(terms.discount_for(3000).unwrap(), 500);
    }

    #[test]
    fn validates_terms() {
        let pct = VoucherTerms {
            discount_type: DiscountType::Percentage,
            value: 120,
            min_spend: 0,
            max_discount: None,
        };
        assert_eq!(pct.validate(), Err(DomainError::InvalidPercentage));
        assert!(fixed(-1).validate().is_err());
        assert!(fixed(1500).validate().is_ok());
    }

    #[test]
    fn parses_discount_types() {
        assert_eq!("FIXED".parse::<DiscountType>().unwrap(), DiscountType::Fixed);
        assert_eq!(
            "percentage".parse::<DiscountType>().unwrap(),
            DiscountType::Percentage
        );
        assert!("bogo".parse::<DiscountType>().is_err());
    }

    #[test]
    fn discount_type_uses_the_stored_names_on_the_wire() {
        assert_eq!(serde_json::to_string(&DiscountType::Fixed).unwrap(), "\"FIXED\"");
        let parsed: DiscountType = serde_json::from_str("\"PERCENTAGE\"").unwrap();
        assert_eq!(parsed, DiscountType::Percentage);
    }

    #[test]
    fn first_order_eligibility() {
        assert!(first_order_eligible(false, 0));
        assert!(first_order_eligible(false, 12));
        assert!(first_order_eligible(true, 0));
        assert!(!first_order_eligible(true, 1));
        assert_eq!(
            ensure_first_order_eligible(true, 3),
            Err(DomainError::FirstOrderOnly)
        );
    }

    #[test]
    fn renewal_window() {
        let now = day(10);
        assert!(renewal_discount_applies(Some(day(15)), now, 7));
        assert!(renewal_discount_applies(Some(day(17)), now, 7));
        assert!(!renewal_discount_applies(Some(day(18)), now, 7));
        assert!(!renewal_discount_applies(Some(day(9)), now, 7));
        assert!(!renewal_discount_applies(None, now, 7));
    }

    #[test]
    fn percent_off() {
        assert_eq!(apply_percent_off(20000, 10), 18000);
        assert_eq!(apply_percent_off(999, 10), 900);
        assert_eq!(apply_percent_off(1000, 150), 0);
    }
}
