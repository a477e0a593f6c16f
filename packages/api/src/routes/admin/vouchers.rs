//! Voucher definitions

use crate::{
    entity::{sea_orm_active_enums::DiscountType, user_voucher, voucher},
    error::ApiError,
    middleware::jwt::AppUser,
    response::{ApiResult, ok},
    services::vouchers,
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use stringline_types::{create_id, now};

/// GET /admin/vouchers
#[tracing::instrument(name = "GET /admin/vouchers", skip(state, user))]
pub async fn list_vouchers(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> ApiResult<Vec<voucher::Model>> {
    user.require_admin(&state).await?;
    let all = voucher::Entity::find()
        .order_by_desc(voucher::Column::CreatedAt)
        .all(&state.db)
        .await?;
    ok(all)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVoucher {
    pub code: String,
    pub name: String,
    pub discount_type: DiscountType,
    pub value: i64,
    #[serde(default)]
    pub min_spend: i64,
    pub max_discount: Option<i64>,
    #[serde(default)]
    pub first_order_only: bool,
    #[serde(default)]
    pub auto_issue: bool,
    pub points_cost: Option<i64>,
    pub valid_until: Option<NaiveDateTime>,
}

/// POST /admin/vouchers
#[tracing::instrument(name = "POST /admin/vouchers", skip(state, user, body))]
pub async fn create_voucher(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(body): Json<CreateVoucher>,
) -> ApiResult<voucher::Model> {
    user.require_admin(&state).await?;
    let code = body.code.trim().to_ascii_uppercase();
    if code.is_empty() || body.name.trim().is_empty() {
        return Err(ApiError::bad_request("Code and name are required"));
    }
    if body.points_cost.is_some_and(|c| c <= 0) {
        return Err(ApiError::bad_request("Points cost must be positive"));
    }

    let taken = voucher::Entity::find()
        .filter(voucher::Column::Code.eq(&code))
        .count(&state.db)
        .await?;
    if taken > 0 {
        return Err(ApiError::conflict(format!("Voucher code {} already exists", code)));
    }

    let now = now();
    let model = voucher::Model {
        id: create_id(),
        code,
        name: body.name.trim().to_string(),
        discount_type: body.discount_type,
        value: body.value,
        min_spend: body.min_spend,
        max_discount: body.max_discount,
        first_order_only: body.first_order_only,
        auto_issue: body.auto_issue,
        points_cost: body.points_cost,
        valid_until: body.valid_until,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    model.terms().validate()?;

    let created = voucher::ActiveModel::from(model)
        .reset_all()
        .insert(&state.db)
        .await?;
    tracing::info!(voucher_id = %created.id, code = %created.code, "Voucher created");
    ok(created)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVoucher {
    pub name: Option<String>,
    pub value: Option<i64>,
    pub min_spend: Option<i64>,
    pub max_discount: Option<i64>,
    pub first_order_only: Option<bool>,
    pub auto_issue: Option<bool>,
    pub points_cost: Option<i64>,
    pub valid_until: Option<NaiveDateTime>,
    pub is_active: Option<bool>,
}

/// PATCH /admin/vouchers/{voucher_id}
#[tracing::instrument(name = "PATCH /admin/vouchers/{voucher_id}", skip(state, user, body))]
pub async fn update_voucher(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(voucher_id): Path<String>,
    Json(body): Json<UpdateVoucher>,
) -> ApiResult<voucher::Model> {
    user.require_admin(&state).await?;
    let mut model = vouchers::find_voucher(&state.db, &voucher_id).await?;

    if let Some(name) = body.name {
        model.name = name;
    }
    if let Some(value) = body.value {
        model.value = value;
    }
    if let Some(min_spend) = body.min_spend {
        model.min_spend = min_spend;
    }
    if body.max_discount.is_some() {
        model.max_discount = body.max_discount;
    }
    if let Some(first_order_only) = body.first_order_only {
        model.first_order_only = first_order_only;
    }
    if let Some(auto_issue) = body.auto_issue {
        model.auto_issue = auto_issue;
    }
    if body.points_cost.is_some() {
        model.points_cost = body.points_cost.filter(|c| *c > 0);
    }
    if body.valid_until.is_some() {
        model.valid_until = body.valid_until;
    }
    if let Some(is_active) = body.is_active {
        model.is_active = is_active;
    }
    model.terms().validate()?;
    model.updated_at = now();

    let active = voucher::ActiveModel::from(model).reset_all();
    ok(active.update(&state.db).await?)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Removed {
    pub id: String,
    /// False when the record was only deactivated
    pub deleted: bool,
}

/// DELETE /admin/vouchers/{voucher_id}. Vouchers already handed out are
/// deactivated instead.
#[tracing::instrument(name = "DELETE /admin/vouchers/{voucher_id}", skip(state, user))]
pub async fn delete_voucher(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(voucher_id): Path<String>,
) -> ApiResult<Removed> {
    user.require_admin(&state).await?;
    let found = vouchers::find_voucher(&state.db, &voucher_id).await?;
    let issued = user_voucher::Entity::find()
        .filter(user_voucher::Column::VoucherId.eq(&found.id))
        .count(&state.db)
        .await?;

    if issued > 0 {
        let mut active: voucher::ActiveModel = found.into();
        active.is_active = Set(false);
        active.updated_at = Set(now());
        active.update(&state.db).await?;
        return ok(Removed {
            id: voucher_id,
            deleted: false,
        });
    }

    found.delete(&state.db).await?;
    ok(Removed {
        id: voucher_id,
        deleted: true,
    })
}
