use crate::{
    cache::cached_json,
    entity::{package, payment, sea_orm_active_enums::PaymentProvider, user_package},
    middleware::jwt::AppUser,
    response::{ApiResult, ok},
    services::packages::{self, PackageQuote},
    state::AppState,
};
use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PACKAGE_LIST_CACHE_KEY: &str = "packages:active";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_packages))
        .route("/mine", get(my_packages))
        .route("/{package_id}/quote", get(quote_package))
        .route("/{package_id}/purchase", post(purchase_package))
}

#[tracing::instrument(name = "GET /packages", skip(state))]
async fn list_packages(State(state): State<AppState>) -> ApiResult<Value> {
    let value = cached_json(&state.response_cache, PACKAGE_LIST_CACHE_KEY, || {
        packages::list_active(&state.db)
    })
    .await?;
    ok(value)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedPackage {
    #[serde(flatten)]
    pub owned: user_package::Model,
    pub package: Option<package::Model>,
}

#[tracing::instrument(name = "GET /packages/mine", skip(state, user))]
async fn my_packages(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> ApiResult<Vec<OwnedPackage>> {
    let customer = user.require_user(&state).await?;
    let owned = packages::list_for_user(&state.db, &customer.id).await?;
    ok(owned
        .into_iter()
        .map(|(owned, package)| OwnedPackage { owned, package })
        .collect())
}

#[tracing::instrument(name = "GET /packages/{package_id}/quote", skip(state, user))]
async fn quote_package(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(package_id): Path<String>,
) -> ApiResult<PackageQuote> {
    let customer = user.require_user(&state).await?;
    let pkg = packages::find_package(&state.db, &package_id).await?;
    ok(packages::quote(&state.db, &state.config, &customer.id, &pkg).await?)
}

#[derive(Debug, Default, Deserialize)]
pub struct PurchaseBody {
    pub provider: Option<PaymentProvider>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub user_package: user_package::Model,
    pub payment: Option<payment::Model>,
}

#[tracing::instrument(name = "POST /packages/{package_id}/purchase", skip(state, user, body))]
async fn purchase_package(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(package_id): Path<String>,
    body: Option<Json<PurchaseBody>>,
) -> ApiResult<Purchase> {
    let customer = user.require_user(&state).await?;
    let provider = body
        .and_then(|Json(b)| b.provider)
        .unwrap_or(PaymentProvider::Manual);
    let (user_package, payment) =
        packages::purchase(&state.db, &state.config, &customer.id, &package_id, provider).await?;
    ok(Purchase {
        user_package,
        payment,
    })
}
