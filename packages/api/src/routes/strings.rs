use crate::{
    entity::string_item,
    response::{ApiResult, ok},
    services::inventory,
    state::AppState,
};
use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_strings))
        .route("/{string_id}", get(get_string))
}

/// Active strings customers can pick from.
#[tracing::instrument(name = "GET /strings", skip(state))]
async fn list_strings(State(state): State<AppState>) -> ApiResult<Vec<string_item::Model>> {
    let items = string_item::Entity::find()
        .filter(string_item::Column::IsActive.eq(true))
        .order_by_asc(string_item::Column::Brand)
        .order_by_asc(string_item::Column::Model)
        .all(&state.db)
        .await?;
    ok(items)
}

#[tracing::instrument(name = "GET /strings/{string_id}", skip(state))]
async fn get_string(
    State(state): State<AppState>,
    Path(string_id): Path<String>,
) -> ApiResult<string_item::Model> {
    ok(inventory::find_item(&state.db, &string_id).await?)
}
