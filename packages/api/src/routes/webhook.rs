use crate::{
    error::ApiError,
    response::{ApiResult, ok},
    services::payments::{self, GatewayCallback, GatewayOutcome},
    state::AppState,
};
use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
};

pub const SIGNATURE_HEADER: &str = "x-gateway-signature";

pub fn routes() -> Router<AppState> {
    Router::new().route("/payment", post(payment_webhook))
}

#[tracing::instrument(name = "POST /webhooks/payment", skip(state, headers, payload))]
async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Bytes,
) -> ApiResult<GatewayOutcome> {
    let secret = state
        .config
        .gateway_secret
        .as_deref()
        .ok_or_else(|| ApiError::service_unavailable("Payment gateway not configured"))?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    payments::verify_gateway_signature(secret, &payload, signature)?;

    let callback: GatewayCallback = serde_json::from_slice(&payload)?;
    ok(payments::handle_gateway_callback(&state.db, callback).await?)
}
