use crate::{
    entity::{sea_orm_active_enums::UserRole, user},
    error::ApiError,
    services::users,
    state::AppState,
};
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use hyper::header::AUTHORIZATION;

#[derive(Debug, Clone)]
pub struct SessionUser {
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AppUser {
    Session(SessionUser),
    Unauthorized,
}

impl AppUser {
    pub fn sub(&self) -> Result<String, ApiError> {
        match self {
            AppUser::Session(user) => Ok(user.sub.clone()),
            AppUser::Unauthorized => Err(ApiError::unauthorized("Sign in required")),
        }
    }

    /// Resolves the signed-in customer, creating the user row on first sight.
    pub async fn require_user(&self, state: &AppState) -> Result<user::Model, ApiError> {
        let AppUser::Session(session) = self else {
            return Err(ApiError::unauthorized("Sign in required"));
        };
        let user = users::ensure_user(
            &state.db,
            &session.sub,
            session.email.clone(),
            session.name.clone(),
        )
        .await?;
        state.role_cache.insert(user.id.clone(), user.role);
        Ok(user)
    }

    /// Like `require_user`, but only staff accounts pass.
    pub async fn require_admin(&self, state: &AppState) -> Result<String, ApiError> {
        let sub = self.sub()?;

        if let Some(role) = state.role_cache.get(&sub) {
            return match role {
                UserRole::Admin => Ok(sub),
                UserRole::Customer => Err(ApiError::FORBIDDEN),
            };
        }

        let user = self.require_user(state).await?;
        if user.role != UserRole::Admin {
            tracing::warn!(user_id = %user.id, "Non-admin attempted an admin action");
            return Err(ApiError::FORBIDDEN);
        }
        Ok(user.id)
    }
}

pub async fn jwt_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response<Body>, ApiError> {
    let mut request = request;
    if let Some(auth_header) = request.headers().get(AUTHORIZATION)
        && let Ok(token) = auth_header.to_str()
    {
        let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();
        let claims = state.sessions.verify(token)?;
        let user = AppUser::Session(SessionUser {
            sub: claims.sub,
            email: claims.email,
            name: claims.name,
        });
        request.extensions_mut().insert::<AppUser>(user);
        return Ok(next.run(request).await);
    }

    request
        .extensions_mut()
        .insert::<AppUser>(AppUser::Unauthorized);
    Ok(next.run(request).await)
}
