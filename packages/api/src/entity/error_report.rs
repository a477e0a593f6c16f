//! Persisted 5xx reports written by the error reporting middleware.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(schema_name = "public", table_name = "ErrorReport")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,

    #[sea_orm(column_name = "userId", column_type = "Text", nullable)]
    pub user_id: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub method: String,

    #[sea_orm(column_type = "Text")]
    pub path: String,

    #[sea_orm(column_name = "statusCode")]
    pub status_code: i32,

    #[sea_orm(column_name = "publicCode", column_type = "Text")]
    pub public_code: String,

    #[sea_orm(column_type = "Text")]
    pub summary: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub details: Option<String>,

    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
