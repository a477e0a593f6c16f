//! `SeaORM` Entity for stringing inventory

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(schema_name = "public", table_name = "StringItem")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_type = "Text")]
    pub brand: String,
    #[sea_orm(column_type = "Text")]
    pub model: String,
    /// Gauge in hundredths of a millimetre, e.g. 66 for 0.66mm
    #[sea_orm(nullable)]
    pub gauge: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub color: Option<String>,
    /// Service price including the string, in cents
    #[sea_orm(column_name = "priceCents")]
    pub price_cents: i64,
    /// Units on hand; one unit strings one racket
    pub stock: i32,
    #[sea_orm(column_name = "lowStockThreshold")]
    pub low_stock_threshold: i32,
    #[sea_orm(column_name = "isActive")]
    pub is_active: bool,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
    #[sea_orm(column_name = "updatedAt")]
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_log::Entity")]
    StockLog,
}

impl Related<super::stock_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
