use crate::{
    entity::{sea_orm_active_enums::UserRole, user},
    middleware::jwt::AppUser,
    response::{ApiResult, Page, ok},
    routes::PaginationParams,
    services::users,
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect};
use serde::Deserialize;

/// GET /admin/users
#[tracing::instrument(name = "GET /admin/users", skip(state, user))]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Query(query): Query<PaginationParams>,
) -> ApiResult<Page<user::Model>> {
    user.require_admin(&state).await?;
    let (limit, offset) = query.bounds();
    let total = user::Entity::find().count(&state.db).await?;
    let items = user::Entity::find()
        .order_by_desc(user::Column::CreatedAt)
        .limit(limit)
        .offset(offset)
        .all(&state.db)
        .await?;
    ok(Page {
        items,
        total,
        limit,
        offset,
    })
}

#[derive(Debug, Deserialize)]
pub struct RoleUpdate {
    pub role: UserRole,
}

/// PATCH /admin/users/{user_id}/role
#[tracing::instrument(name = "PATCH /admin/users/{user_id}/role", skip(state, user, body))]
pub async fn set_role(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(user_id): Path<String>,
    Json(body): Json<RoleUpdate>,
) -> ApiResult<user::Model> {
    let admin_id = user.require_admin(&state).await?;
    let target = users::find_user(&state.db, &user_id).await?;

    let mut active: user::ActiveModel = target.into();
    active.role = Set(body.role);
    active.updated_at = Set(stringline_types::now());
    let updated = active.update(&state.db).await?;

    state.role_cache.invalidate(&updated.id);
    tracing::info!(admin_id, user_id = %updated.id, role = ?body.role, "User role changed");
    ok(updated)
}
