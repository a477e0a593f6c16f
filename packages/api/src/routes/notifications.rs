use crate::{
    entity::notification,
    error::ApiError,
    middleware::jwt::AppUser,
    response::{ApiResult, Page, ok},
    state::AppState,
};
use axum::{
    Extension, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use stringline_types::{now, utils::page_bounds};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/unread-count", get(unread_count))
        .route("/read-all", post(mark_all_read))
        .route("/{notification_id}/read", post(mark_read))
}

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    pub unread: Option<bool>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[tracing::instrument(name = "GET /notifications", skip(state, user))]
async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Page<notification::Model>> {
    let sub = user.sub()?;
    let (limit, offset) = page_bounds(query.limit, query.offset);

    let mut condition = Condition::all().add(notification::Column::UserId.eq(&sub));
    if query.unread == Some(true) {
        condition = condition.add(notification::Column::Read.eq(false));
    }

    let base = notification::Entity::find().filter(condition);
    let total = base.clone().count(&state.db).await?;
    let items = base
        .order_by_desc(notification::Column::CreatedAt)
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

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread: u64,
}

#[tracing::instrument(name = "GET /notifications/unread-count", skip(state, user))]
async fn unread_count(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> ApiResult<UnreadCount> {
    let sub = user.sub()?;
    let unread = notification::Entity::find()
        .filter(notification::Column::UserId.eq(&sub))
        .filter(notification::Column::Read.eq(false))
        .count(&state.db)
        .await?;
    ok(UnreadCount { unread })
}

#[tracing::instrument(name = "POST /notifications/{notification_id}/read", skip(state, user))]
async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(notification_id): Path<String>,
) -> ApiResult<notification::Model> {
    let sub = user.sub()?;
    let found = notification::Entity::find_by_id(&notification_id)
        .one(&state.db)
        .await?
        .filter(|n| n.user_id == sub)
        .ok_or_else(|| ApiError::not_found(format!("Notification {} not found", notification_id)))?;
    if found.read {
        return ok(found);
    }

    let mut active: notification::ActiveModel = found.into();
    active.read = Set(true);
    active.read_at = Set(Some(now()));
    ok(active.update(&state.db).await?)
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

#[tracing::instrument(name = "POST /notifications/read-all", skip(state, user))]
async fn mark_all_read(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> ApiResult<MarkedRead> {
    let sub = user.sub()?;
    let result = notification::Entity::update_many()
        .col_expr(notification::Column::Read, Expr::value(true))
        .col_expr(notification::Column::ReadAt, Expr::value(Some(now())))
        .filter(notification::Column::UserId.eq(&sub))
        .filter(notification::Column::Read.eq(false))
        .exec(&state.db)
        .await?;
    ok(MarkedRead {
        updated: result.rows_affected,
    })
}
