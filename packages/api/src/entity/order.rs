//! `SeaORM` Entity for stringing orders

use super::sea_orm_active_enums::OrderStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A racket booked in for stringing. Cancelled in place, never deleted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(schema_name = "public", table_name = "Order")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_name = "userId", column_type = "Text")]
    pub user_id: String,
    #[sea_orm(column_name = "stringItemId", column_type = "Text")]
    pub string_item_id: String,
    /// Main string tension in lbs
    #[sea_orm(column_name = "tensionMain")]
    pub tension_main: i32,
    /// Cross string tension in lbs
    #[sea_orm(column_name = "tensionCross")]
    pub tension_cross: i32,
    #[sea_orm(column_name = "racketBrand", column_type = "Text", nullable)]
    pub racket_brand: Option<String>,
    #[sea_orm(column_name = "racketModel", column_type = "Text", nullable)]
    pub racket_model: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub status: OrderStatus,
    /// List price in cents
    pub price: i64,
    /// Voucher discount in cents
    pub discount: i64,
    #[sea_orm(column_name = "finalPrice")]
    pub final_price: i64,
    #[sea_orm(column_name = "userPackageId", column_type = "Text", nullable)]
    pub user_package_id: Option<String>,
    #[sea_orm(column_name = "userVoucherId", column_type = "Text", nullable)]
    pub user_voucher_id: Option<String>,
    #[sea_orm(column_name = "isOverdue")]
    pub is_overdue: bool,
    #[sea_orm(column_name = "statusChangedAt")]
    pub status_changed_at: DateTime,
    #[sea_orm(column_name = "confirmedAt", nullable)]
    pub confirmed_at: Option<DateTime>,
    #[sea_orm(column_name = "etaOverride", nullable)]
    pub eta_override: Option<DateTime>,
    #[sea_orm(column_name = "completedAt", nullable)]
    pub completed_at: Option<DateTime>,
    #[sea_orm(column_name = "pointsAwarded")]
    pub points_awarded: bool,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
    #[sea_orm(column_name = "updatedAt")]
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::string_item::Entity",
        from = "Column::StringItemId",
        to = "super::string_item::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    StringItem,
    #[sea_orm(has_many = "super::order_status_log::Entity")]
    OrderStatusLog,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::string_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StringItem.def()
    }
}

impl Related<super::order_status_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderStatusLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
