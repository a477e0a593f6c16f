use crate::{
    error::ApiError,
    response::{ApiResult, ok},
    services::orders::{self, SweepReport},
    state::AppState,
};
use axum::{Router, extract::State, http::HeaderMap, routing::post};

pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

pub fn routes() -> Router<AppState> {
    Router::new().route("/order-automation", post(order_automation))
}

fn check_cron_secret(expected: Option<&str>, headers: &HeaderMap) -> Result<(), ApiError> {
    let expected =
        expected.ok_or_else(|| ApiError::service_unavailable("Cron endpoint not configured"))?;
    let provided = headers
        .get(CRON_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::UNAUTHORIZED)?;
    if blake3::hash(provided.as_bytes()) != blake3::hash(expected.as_bytes()) {
        return Err(ApiError::UNAUTHORIZED);
    }
    Ok(())
}

#[tracing::instrument(name = "POST /cron/order-automation", skip(state, headers))]
async fn order_automation(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<SweepReport> {
    check_cron_secret(state.config.cron_secret.as_deref(), &headers)?;
    ok(orders::sweep_overdue(&state.db, state.config.overdue_hours).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    #[test]
    fn cron_secret_must_match() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            check_cron_secret(Some("s3cret"), &headers).unwrap_err().status(),
            StatusCode::UNAUTHORIZED
        );

        headers.insert(CRON_SECRET_HEADER, HeaderValue::from_static("nope"));
        assert!(check_cron_secret(Some("s3cret"), &headers).is_err());

        headers.insert(CRON_SECRET_HEADER, HeaderValue::from_static("s3cret"));
        assert!(check_cron_secret(Some("s3cret"), &headers).is_ok());

        assert_eq!(
            check_cron_secret(None, &headers).unwrap_err().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
