//! `SeaORM` Entity for discount vouchers

use super::sea_orm_active_enums::DiscountType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use stringline::pricing::VoucherTerms;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(schema_name = "public", table_name = "Voucher")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    /// Upper-case redemption code
    #[sea_orm(column_type = "Text", unique)]
    pub code: String,
    #[sea_orm(column_type = "Text")]
    pub name: String,
    #[sea_orm(column_name = "discountType")]
    pub discount_type: DiscountType,
    /// Cents for fixed vouchers, whole percent for percentage vouchers
    pub value: i64,
    #[sea_orm(column_name = "minSpend")]
    pub min_spend: i64,
    #[sea_orm(column_name = "maxDiscount", nullable)]
    pub max_discount: Option<i64>,
    #[sea_orm(column_name = "firstOrderOnly")]
    pub first_order_only: bool,
    /// Issued to every new customer
    #[sea_orm(column_name = "autoIssue")]
    pub auto_issue: bool,
    /// Redeemable with points when set
    #[sea_orm(column_name = "pointsCost", nullable)]
    pub points_cost: Option<i64>,
    #[sea_orm(column_name = "validUntil", nullable)]
    pub valid_until: Option<DateTime>,
    #[sea_orm(column_name = "isActive")]
    pub is_active: bool,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
    #[sea_orm(column_name = "updatedAt")]
    pub updated_at: DateTime,
}

impl Model {
    pub fn terms(&self) -> VoucherTerms {
        VoucherTerms {
            discount_type: self.discount_type,
            value: self.value,
            min_spend: self.min_spend,
            max_discount: self.max_discount,
        }
    }

    pub fn is_usable_at(&self, now: DateTime) -> bool {
        self.is_active && self.valid_until.map(|v| v > now).unwrap_or(true)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_voucher::Entity")]
    UserVoucher,
}

impl Related<super::user_voucher::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserVoucher.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
