//! `SeaORM` Entity for customers and staff

use super::sea_orm_active_enums::{MembershipTier, UserRole};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(schema_name = "public", table_name = "User")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Subject of the session token
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub email: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub phone: Option<String>,
    pub role: UserRole,
    /// Denormalized sum of the points ledger
    pub points: i64,
    #[sea_orm(column_name = "referralCode", column_type = "Text", unique)]
    pub referral_code: String,
    #[sea_orm(column_name = "referredBy", column_type = "Text", nullable)]
    pub referred_by: Option<String>,
    #[sea_orm(column_name = "membershipTier")]
    pub membership_tier: MembershipTier,
    /// Lifetime spend on fulfilled orders, in cents
    #[sea_orm(column_name = "totalSpent")]
    pub total_spent: i64,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
    #[sea_orm(column_name = "updatedAt")]
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
