//! `SeaORM` Entity for sellable stringing packages

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(schema_name = "public", table_name = "Package")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_type = "Text")]
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// Number of stringing credits granted
    pub sessions: i32,
    #[sea_orm(column_name = "validityDays")]
    pub validity_days: i32,
    #[sea_orm(column_name = "priceCents")]
    pub price_cents: i64,
    #[sea_orm(column_name = "firstOrderOnly")]
    pub first_order_only: bool,
    #[sea_orm(column_name = "isActive")]
    pub is_active: bool,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
    #[sea_orm(column_name = "updatedAt")]
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_package::Entity")]
    UserPackage,
}

impl Related<super::user_package::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserPackage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
