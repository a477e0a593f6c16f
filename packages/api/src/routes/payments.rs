use crate::{
    entity::{payment, sea_orm_active_enums::UserRole},
    error::ApiError,
    middleware::jwt::AppUser,
    response::{ApiResult, Page, ok},
    routes::PaginationParams,
    services::payments::{self, CreatePayment},
    state::AppState,
    storage::content_type_for,
};
use axum::{
    Extension, Json, Router,
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::header,
    response::Response,
    routing::{get, post},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_payments).post(create_payment))
        .route("/{payment_id}", get(get_payment))
        .route("/{payment_id}/proof", post(upload_proof).get(download_proof))
}

#[tracing::instrument(name = "GET /payments", skip(state, user))]
async fn list_payments(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Query(query): Query<PaginationParams>,
) -> ApiResult<Page<payment::Model>> {
    let customer = user.require_user(&state).await?;
    let (limit, offset) = query.bounds();
    let (items, total) = payments::list_for_user(&state.db, &customer.id, limit, offset).await?;
    ok(Page {
        items,
        total,
        limit,
        offset,
    })
}

#[tracing::instrument(name = "POST /payments", skip(state, user, body))]
async fn create_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(body): Json<CreatePayment>,
) -> ApiResult<payment::Model> {
    let customer = user.require_user(&state).await?;
    ok(payments::create_intent(&state.db, &customer.id, body).await?)
}

async fn visible_payment(
    state: &AppState,
    user: &AppUser,
    payment_id: &str,
) -> Result<payment::Model, ApiError> {
    let customer = user.require_user(state).await?;
    if customer.role == UserRole::Admin {
        payments::find_payment(&state.db, payment_id).await
    } else {
        payments::find_owned(&state.db, &customer.id, payment_id).await
    }
}

#[tracing::instrument(name = "GET /payments/{payment_id}", skip(state, user))]
async fn get_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(payment_id): Path<String>,
) -> ApiResult<payment::Model> {
    ok(visible_payment(&state, &user, &payment_id).await?)
}

/// Multipart upload; the image is read from the `file` field.
#[tracing::instrument(name = "POST /payments/{payment_id}/proof", skip(state, user, multipart))]
async fn upload_proof(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(payment_id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<payment::Model> {
    let customer = user.require_user(&state).await?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;
        let updated = payments::attach_proof(
            &state.db,
            &state.proofs,
            &customer.id,
            &payment_id,
            content_type.as_deref(),
            data,
            state.config.max_upload_bytes,
        )
        .await?;
        return ok(updated);
    }

    Err(ApiError::bad_request("Missing multipart field 'file'"))
}

#[tracing::instrument(name = "GET /payments/{payment_id}/proof", skip(state, user))]
async fn download_proof(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(payment_id): Path<String>,
) -> Result<Response, ApiError> {
    let found = visible_payment(&state, &user, &payment_id).await?;
    let key = found
        .proof_url
        .ok_or_else(|| ApiError::not_found("No proof uploaded for this payment"))?;
    let data = state.proofs.get(&key).await?;

    Response::builder()
        .header(header::CONTENT_TYPE, content_type_for(&key))
        .header(header::CACHE_CONTROL, "private, max-age=300")
        .body(Body::from(data))
        .map_err(|e| ApiError::internal(format!("Failed to build proof response: {}", e)))
}
