//! `SeaORM` Entity for the inventory audit trail

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(schema_name = "public", table_name = "StockLog")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_name = "stringItemId", column_type = "Text")]
    pub string_item_id: String,
    /// Signed unit change
    pub change: i32,
    #[sea_orm(column_name = "stockAfter")]
    pub stock_after: i32,
    #[sea_orm(column_type = "Text")]
    pub reason: String,
    #[sea_orm(column_name = "orderId", column_type = "Text", nullable)]
    pub order_id: Option<String>,
    #[sea_orm(column_name = "adminId", column_type = "Text", nullable)]
    pub admin_id: Option<String>,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::string_item::Entity",
        from = "Column::StringItemId",
        to = "super::string_item::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    StringItem,
}

impl Related<super::string_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StringItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
