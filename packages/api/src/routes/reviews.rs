use crate::{
    cache::cached_json,
    entity::review,
    middleware::jwt::AppUser,
    response::{ApiResult, Page, ok},
    routes::PaginationParams,
    services::reviews,
    state::AppState,
};
use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use serde_json::Value;

pub const REVIEW_SUMMARY_CACHE_KEY: &str = "reviews:summary";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reviews).post(create_review))
        .route("/summary", get(review_summary))
}

#[tracing::instrument(name = "GET /reviews", skip(state))]
async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<PaginationParams>,
) -> ApiResult<Page<review::Model>> {
    let (limit, offset) = query.bounds();
    let (items, total) = reviews::list(&state.db, limit, offset).await?;
    ok(Page {
        items,
        total,
        limit,
        offset,
    })
}

#[tracing::instrument(name = "GET /reviews/summary", skip(state))]
async fn review_summary(State(state): State<AppState>) -> ApiResult<Value> {
    let value = cached_json(&state.response_cache, REVIEW_SUMMARY_CACHE_KEY, || {
        reviews::summary(&state.db)
    })
    .await?;
    ok(value)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReview {
    pub order_id: String,
    pub rating: i32,
    pub comment: Option<String>,
}

#[tracing::instrument(name = "POST /reviews", skip(state, user, body))]
async fn create_review(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(body): Json<CreateReview>,
) -> ApiResult<review::Model> {
    let customer = user.require_user(&state).await?;
    let created = reviews::create(
        &state.db,
        &customer.id,
        &body.order_id,
        body.rating,
        body.comment,
    )
    .await?;
    state.response_cache.invalidate(REVIEW_SUMMARY_CACHE_KEY);
    ok(created)
}
