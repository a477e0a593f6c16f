use crate::{
    entity::user,
    error::ApiError,
    middleware::jwt::AppUser,
    response::{ApiResult, ok},
    state::AppState,
};
use axum::{
    Extension, Json, Router,
    extract::State,
    routing::{get, post},
};
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use serde::{Deserialize, Serialize};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_profile).patch(update_profile))
        .route("/session", post(refresh_session))
}

#[tracing::instrument(name = "GET /profile", skip(state, user))]
async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> ApiResult<user::Model> {
    let profile = user.require_user(&state).await?;
    ok(profile)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[tracing::instrument(name = "PATCH /profile", skip(state, user, body))]
async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(body): Json<UpdateProfile>,
) -> ApiResult<user::Model> {
    let profile = user.require_user(&state).await?;

    let mut active: user::ActiveModel = profile.into();
    if let Some(name) = body.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::bad_request("Name cannot be empty"));
        }
        active.name = Set(Some(name));
    }
    if let Some(phone) = body.phone {
        let phone = phone.trim().to_string();
        active.phone = Set((!phone.is_empty()).then_some(phone));
    }
    active.updated_at = Set(stringline_types::now());
    let updated = active.update(&state.db).await?;
    ok(updated)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub expires_in_hours: i64,
}

/// Reissues the caller's token with a fresh expiry.
#[tracing::instrument(name = "POST /profile/session", skip(state, user))]
async fn refresh_session(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> ApiResult<SessionResponse> {
    let profile = user.require_user(&state).await?;
    let token = state
        .sessions
        .issue(&profile.id, profile.email.clone(), profile.name.clone())?;
    ok(SessionResponse {
        token,
        expires_in_hours: state.config.session_ttl_hours,
    })
}
