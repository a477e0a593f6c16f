//! Points, membership tiers and referral rewards.

use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Points granted for reviewing a fulfilled order.
pub const REVIEW_REWARD_POINTS: i64 = 10;

pub const SILVER_SPEND_CENTS: i64 = 50_000;
pub const GOLD_SPEND_CENTS: i64 = 150_000;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, EnumIter, DeriveActiveEnum, Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipTier {
    #[sea_orm(string_value = "STANDARD")]
    Standard,
    #[sea_orm(string_value = "SILVER")]
    Silver,
    #[sea_orm(string_value = "GOLD")]
    Gold,
}

impl MembershipTier {
    pub fn for_total_spent(total_spent: i64) -> Self {
        if total_spent >= GOLD_SPEND_CENTS {
            MembershipTier::Gold
        } else if total_spent >= SILVER_SPEND_CENTS {
            MembershipTier::Silver
        } else {
            MembershipTier::Standard
        }
    }

    /// Multiplier in tenths so the arithmetic stays integral.
    fn multiplier_tenths(&self) -> i64 {
        match self {
            MembershipTier::Standard => 10,
            MembershipTier::Silver => 12,
            MembershipTier::Gold => 15,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MembershipTier::Standard => "Standard",
            MembershipTier::Silver => "Silver",
            MembershipTier::Gold => "Gold",
        }
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier_tenths() as f64 / 10.0
    }
}

/// One point per whole currency unit paid, scaled by tier and rounded down.
pub fn points_for_order(final_price: i64, tier: MembershipTier) -> i64 {
    if final_price <= 0 {
        return 0;
    }
    (final_price / 100) * tier.multiplier_tenths() / 10
}

/// Flat reward for the referrer's `nth` successful referral (1-based).
pub fn referral_reward(nth_referral: u64) -> i64 {
    match nth_referral {
        0 => 0,
        1..=5 => 50,
        6..=10 => 80,
        _ => 100,
    }
}

pub fn ensure_balance(balance: i64, required: i64) -> Result<(), DomainError> {
    if required < 0 {
        return Err(DomainError::Negative("points cost"));
    }
    if balance < required {
        return Err(DomainError::InsufficientPoints { balance, required });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsStats {
    pub earned: i64,
    pub spent: i64,
    pub balance: i64,
}

impl PointsStats {
    pub fn from_deltas<I>(deltas: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        let mut stats = PointsStats::default();
        for delta in deltas {
            if delta > 0 {
                stats.earned += delta;
            } else {
                stats.spent += delta.abs();
            }
        }
        stats.balance = stats.earned - stats.spent;
        stats
    }
}

/// Referral codes are 8 upper-case characters taken from a cuid.
pub fn referral_code_from(id: &str) -> String {
    id.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .rev()
        .take(8)
        .collect::<String>()
        .to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referral_tiers() {
        for n in 1..=5 {
            assert_eq!(referral_reward(n), 50);
        }
        for n in 6..=10 {
            assert_eq!(referral_reward(n), 80);
        }
        assert_eq!(referral_reward(11), 100);
        assert_eq!(referral_reward(250), 100);
        assert_eq!(referral_reward(0), 0);
    }

    #[test]
    fn points_stats_split_signs() {
        let stats = PointsStats::from_deltas([100, -30, 50, -20, 0]);
        assert_eq!(stats.earned, 150);
        assert_eq!(stats.spent, 50);
        assert_eq!(stats.balance, 100);
    }

    #[test]
    fn points_stats_empty() {
        assert_eq!(PointsStats::from_deltas(Vec::new()), PointsStats::default());
    }

    #[test]
    fn tiers_follow_spend() {
        assert_eq!(MembershipTier::for_total_spent(0), MembershipTier::Standard);
        assert_eq!(MembershipTier::for_total_spent(49_999), MembershipTier::Standard);
        assert_eq!(MembershipTier::for_total_spent(50_000), MembershipTier::Silver);
        assert_eq!(MembershipTier::for_total_spent(150_000), MembershipTier::Gold);
        assert!(MembershipTier::Gold > MembershipTier::Silver);
    }

    #[test]
    fn order_points_scale_with_tier() {
        assert_eq!(points_for_order(2899, MembershipTier::Standard), 28);
        assert_eq!(points_for_order(2899, MembershipTier::Silver), 33);
        assert_eq!(points_for_order(2899, MembershipTier::Gold), 42);
        assert_eq!(points_for_order(0, MembershipTier::Gold), 0);
        assert_eq!(MembershipTier::Silver.multiplier(), 1.2);
    }

    #[test]
    fn balance_checks() {
        assert!(ensure_balance(100, 100).is_ok());
        assert_eq!(
            ensure_balance(99, 100),
            Err(DomainError::InsufficientPoints {
                balance: 99,
                required: 100
            })
        );
        assert!(ensure_balance(10, -1).is_err());
    }

    #[test]
    fn referral_codes_are_short_and_upper() {
        let code = referral_code_from("clx9a0b1c2d3e4f5");
        assert_eq!(code.len(), 8);
        assert_eq!(code, code.to_ascii_uppercase());
    }
}
