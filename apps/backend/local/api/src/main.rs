#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::{sync::Arc, time::Duration};
use stringline_api::{
    construct_router, schema,
    services::orders,
    state::{AppState, State},
    storage::ProofStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let config = config::Config::from_env()?;

    let sentry_guard = config.sentry_dsn.as_ref().map(|dsn| {
        sentry::init((
            dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                traces_sample_rate: 0.3,
                ..Default::default()
            },
        ))
    });

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new("info,sqlx=warn")
        }))
        .with(sentry_guard.as_ref().map(|_| sentry_tracing::layer()))
        .init();

    tracing::info!("Starting Stringline API");

    let db = State::connect(&config.database_url, false).await?;
    if config.auto_migrate {
        schema::sync(&db).await?;
    }

    let proofs = ProofStore::local(&config.upload_dir)?;
    let state: AppState = Arc::new(State::new(
        db,
        config.service.clone(),
        config.session_secret.as_bytes(),
        proofs,
    ));

    if config.automation_interval_secs > 0 {
        spawn_automation(state.clone(), config.automation_interval_secs);
    } else {
        tracing::info!("Order automation ticker disabled");
    }

    let app = construct_router(state, config.static_dir.as_deref());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum_serve(listener, app).await?;

    Ok(())
}

async fn axum_serve(
    listener: tokio::net::TcpListener,
    app: stringline_api::axum::Router,
) -> std::io::Result<()> {
    stringline_api::axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutting down");
        })
        .await
}

/// Runs the overdue sweep on a fixed interval. A failed run is logged and
/// retried on the next tick.
fn spawn_automation(state: AppState, interval_secs: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = orders::sweep_overdue(&state.db, state.config.overdue_hours).await {
                tracing::error!("Order automation sweep failed: {}", e);
            }
        }
    });
    tracing::info!(interval_secs, "Order automation ticker started");
}
