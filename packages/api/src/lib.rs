use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::get,
};
use middleware::{error_reporting::error_reporting_middleware, jwt::jwt_middleware};
use response::{ApiResult, ok};
use serde::Serialize;
use state::AppState;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    decompression::RequestDecompressionLayer,
    services::{ServeDir, ServeFile},
};

pub mod cache;
pub mod config;
pub mod entity;
pub mod error;
mod middleware;
pub mod response;
mod routes;
pub mod schema;
pub mod services;
pub mod session;
pub mod state;
pub mod storage;

pub use axum;
pub mod auth {
    use crate::middleware;
    pub use middleware::jwt::AppUser;
}

pub use sea_orm;

/// Multipart framing on top of the largest accepted proof image.
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

/// Builds the `/api` router. Every other path falls through to the static
/// bundle when `static_dir` is given.
pub fn construct_router(state: AppState, static_dir: Option<&str>) -> Router {
    let body_limit = state.config.max_upload_bytes + BODY_OVERHEAD_BYTES;

    let api = Router::new()
        .route("/", get(api_info))
        .nest("/health", routes::health::routes())
        .nest("/profile", routes::profile::routes())
        .nest("/strings", routes::strings::routes())
        .nest("/orders", routes::orders::routes())
        .nest("/payments", routes::payments::routes())
        .nest("/packages", routes::packages::routes())
        .nest("/vouchers", routes::vouchers::routes())
        .nest("/points", routes::points::routes())
        .nest("/referrals", routes::referrals::routes())
        .nest("/reviews", routes::reviews::routes())
        .nest("/notifications", routes::notifications::routes())
        .nest("/webhooks", routes::webhook::routes())
        .nest("/cron", routes::cron::routes())
        .nest("/admin", routes::admin::routes())
        .fallback(api_not_found)
        .with_state(state.clone())
        .layer(from_fn_with_state(state.clone(), error_reporting_middleware))
        .layer(from_fn_with_state(state.clone(), jwt_middleware))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(
            ServiceBuilder::new()
                .layer(RequestDecompressionLayer::new())
                .layer(CompressionLayer::new()),
        );

    let router = Router::new().nest("/api", api);
    match static_dir {
        Some(dir) => {
            let index = ServeFile::new(format!("{}/index.html", dir.trim_end_matches('/')));
            router.fallback_service(ServeDir::new(dir).fallback(index))
        }
        None => router,
    }
}

#[derive(Serialize)]
struct ApiInfo {
    name: &'static str,
    version: &'static str,
}

#[tracing::instrument(name = "GET /")]
async fn api_info() -> ApiResult<ApiInfo> {
    ok(ApiInfo {
        name: "stringline",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn api_not_found() -> error::ApiError {
    error::ApiError::not_found("No such endpoint")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ServiceConfig, state::State, storage::ProofStore};
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use sea_orm::DatabaseConnection;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let config = ServiceConfig {
            cron_secret: Some("cron-secret".into()),
            ..ServiceConfig::default()
        };
        let state = Arc::new(State::new(
            DatabaseConnection::default(),
            config,
            b"router-test-secret",
            ProofStore::in_memory(),
        ));
        construct_router(state, None)
    }

    async fn call(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_uses_the_envelope() {
        let (status, body) = call(get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_api_paths_are_json_404s() {
        let (status, body) = call(get("/api/does-not-exist")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn customer_routes_need_a_session() {
        let (status, body) = call(get("/api/profile")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");

        let request = Request::builder()
            .uri("/api/orders")
            .header("authorization", "Bearer not-a-token")
            .body(Body::empty())
            .unwrap();
        let (status, _) = call(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn webhook_is_disabled_without_a_secret() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/webhooks/payment")
            .body(Body::from("{}"))
            .unwrap();
        let (status, _) = call(request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn cron_rejects_a_wrong_secret() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/cron/order-automation")
            .header("x-cron-secret", "guess")
            .body(Body::empty())
            .unwrap();
        let (status, _) = call(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
