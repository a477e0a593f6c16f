use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;
use std::{sync::Arc, time::Duration};

use crate::config::ServiceConfig;
use crate::entity::sea_orm_active_enums::UserRole;
use crate::error::ApiError;
use crate::session::SessionKeys;
use crate::storage::ProofStore;

pub type AppState = Arc<State>;

pub struct State {
    pub db: DatabaseConnection,
    pub config: ServiceConfig,
    pub sessions: SessionKeys,
    pub proofs: ProofStore,
    /// Short-lived cache for public read endpoints, keyed by route
    pub response_cache: moka::sync::Cache<String, Value>,
    /// sub -> role, so admin checks skip a query on hot paths
    pub role_cache: moka::sync::Cache<String, UserRole>,
}

impl State {
    pub async fn connect(database_url: &str, sqlx_logging: bool) -> Result<DatabaseConnection, ApiError> {
        let mut opt = ConnectOptions::new(database_url.to_owned());
        opt.max_connections(10)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .sqlx_logging(sqlx_logging);
        Ok(Database::connect(opt).await?)
    }

    pub fn new(
        db: DatabaseConnection,
        config: ServiceConfig,
        session_secret: &[u8],
        proofs: ProofStore,
    ) -> Self {
        let sessions = SessionKeys::new(session_secret, config.session_ttl_hours);

        let response_cache = moka::sync::Cache::builder()
            .max_capacity(1_000)
            .time_to_live(Duration::from_secs(60))
            .build();

        let role_cache = moka::sync::Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(5 * 60))
            .build();

        Self {
            db,
            config,
            sessions,
            proofs,
            response_cache,
            role_cache,
        }
    }

    pub fn invalidate_public_cache(&self) {
        self.response_cache.invalidate_all();
    }
}
