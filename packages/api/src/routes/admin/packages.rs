//! Package catalogue

use crate::{
    entity::{package, user_package},
    error::ApiError,
    middleware::jwt::AppUser,
    response::{ApiResult, ok},
    routes::admin::vouchers::Removed,
    services::packages,
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use serde::Deserialize;
use stringline_types::{create_id, now};

/// GET /admin/packages
#[tracing::instrument(name = "GET /admin/packages", skip(state, user))]
pub async fn list_packages(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> ApiResult<Vec<package::Model>> {
    user.require_admin(&state).await?;
    let all = package::Entity::find()
        .order_by_asc(package::Column::PriceCents)
        .all(&state.db)
        .await?;
    ok(all)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePackage {
    pub name: String,
    pub description: Option<String>,
    pub sessions: i32,
    pub validity_days: i32,
    pub price_cents: i64,
    #[serde(default)]
    pub first_order_only: bool,
}

fn check_terms(sessions: i32, validity_days: i32, price_cents: i64) -> Result<(), ApiError> {
    if sessions < 1 {
        return Err(ApiError::bad_request("A package needs at least one session"));
    }
    if validity_days < 1 {
        return Err(ApiError::bad_request("Validity must be at least one day"));
    }
    if price_cents < 0 {
        return Err(ApiError::bad_request("Price cannot be negative"));
    }
    Ok(())
}

/// POST /admin/packages
#[tracing::instrument(name = "POST /admin/packages", skip(state, user, body))]
pub async fn create_package(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(body): Json<CreatePackage>,
) -> ApiResult<package::Model> {
    user.require_admin(&state).await?;
    if body.name.trim().is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    check_terms(body.sessions, body.validity_days, body.price_cents)?;

    let now = now();
    let created = package::ActiveModel {
        id: Set(create_id()),
        name: Set(body.name.trim().to_string()),
        description: Set(body.description),
        sessions: Set(body.sessions),
        validity_days: Set(body.validity_days),
        price_cents: Set(body.price_cents),
        first_order_only: Set(body.first_order_only),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    state.invalidate_public_cache();
    tracing::info!(package_id = %created.id, "Package created");
    ok(created)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePackage {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sessions: Option<i32>,
    pub validity_days: Option<i32>,
    pub price_cents: Option<i64>,
    pub first_order_only: Option<bool>,
    pub is_active: Option<bool>,
}

/// PATCH /admin/packages/{package_id}. Already sold packages keep the terms
/// they were bought with.
#[tracing::instrument(name = "PATCH /admin/packages/{package_id}", skip(state, user, body))]
pub async fn update_package(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(package_id): Path<String>,
    Json(body): Json<UpdatePackage>,
) -> ApiResult<package::Model> {
    user.require_admin(&state).await?;
    let mut model = packages::find_package(&state.db, &package_id).await?;

    if let Some(name) = body.name {
        model.name = name;
    }
    if body.description.is_some() {
        model.description = body.description;
    }
    if let Some(sessions) = body.sessions {
        model.sessions = sessions;
    }
    if let Some(validity_days) = body.validity_days {
        model.validity_days = validity_days;
    }
    if let Some(price_cents) = body.price_cents {
        model.price_cents = price_cents;
    }
    if let Some(first_order_only) = body.first_order_only {
        model.first_order_only = first_order_only;
    }
    if let Some(is_active) = body.is_active {
        model.is_active = is_active;
    }
    check_terms(model.sessions, model.validity_days, model.price_cents)?;
    model.updated_at = now();

    let active = package::ActiveModel::from(model).reset_all();
    let updated = active.update(&state.db).await?;
    state.invalidate_public_cache();
    ok(updated)
}

/// DELETE /admin/packages/{package_id}
#[tracing::instrument(name = "DELETE /admin/packages/{package_id}", skip(state, user))]
pub async fn delete_package(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(package_id): Path<String>,
) -> ApiResult<Removed> {
    user.require_admin(&state).await?;
    let found = packages::find_package(&state.db, &package_id).await?;
    let sold = user_package::Entity::find()
        .filter(user_package::Column::PackageId.eq(&found.id))
        .count(&state.db)
        .await?;

    let deleted = if sold > 0 {
        let mut active: package::ActiveModel = found.into();
        active.is_active = Set(false);
        active.updated_at = Set(now());
        active.update(&state.db).await?;
        false
    } else {
        found.delete(&state.db).await?;
        true
    };

    state.invalidate_public_cache();
    ok(Removed {
        id: package_id,
        deleted,
    })
}
