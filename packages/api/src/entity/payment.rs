//! `SeaORM` Entity for payments against orders and package purchases

use super::sea_orm_active_enums::{PaymentProvider, PaymentStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Exactly one of `order_id` / `user_package_id` is set.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(schema_name = "public", table_name = "Payment")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_name = "userId", column_type = "Text")]
    pub user_id: String,
    #[sea_orm(column_name = "orderId", column_type = "Text", nullable)]
    pub order_id: Option<String>,
    #[sea_orm(column_name = "userPackageId", column_type = "Text", nullable)]
    pub user_package_id: Option<String>,
    /// Amount due in cents
    pub amount: i64,
    pub provider: PaymentProvider,
    pub status: PaymentStatus,
    #[sea_orm(column_name = "proofUrl", column_type = "Text", nullable)]
    pub proof_url: Option<String>,
    /// Gateway transaction reference
    #[sea_orm(column_name = "externalRef", column_type = "Text", nullable)]
    pub external_ref: Option<String>,
    #[sea_orm(column_name = "rejectReason", column_type = "Text", nullable)]
    pub reject_reason: Option<String>,
    #[sea_orm(column_name = "verifiedBy", column_type = "Text", nullable)]
    pub verified_by: Option<String>,
    #[sea_orm(column_name = "verifiedAt", nullable)]
    pub verified_at: Option<DateTime>,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
    #[sea_orm(column_name = "updatedAt")]
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::user_package::Entity",
        from = "Column::UserPackageId",
        to = "super::user_package::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    UserPackage,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::user_package::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserPackage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
