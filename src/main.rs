//! Peerbridge server binary: configuration, wiring, and Axum serve.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use peerbridge::adapters::clock::SystemClock;
use peerbridge::adapters::email::{ResendConfig, ResendNotifier};
use peerbridge::adapters::http::{api_router, AppState};
use peerbridge::adapters::postgres::{
    PostgresAvailabilityRepository, PostgresCallRepository, PostgresCatalogReader,
    PostgresDirectoryReader, PostgresGroupSessionRepository, PostgresParticipantRepository,
    PostgresPayoutLedger, PostgresPurchaseRepository, PostgresWebhookEventRepository,
};
use peerbridge::adapters::rooms::{DailyConfig, DailyRoomProvisioner};
use peerbridge::adapters::stripe::{StripeConfig, StripeGateway};
use peerbridge::application::handlers::lifecycle::LifecycleEngine;
use peerbridge::application::handlers::payouts::PayoutInitiator;
use peerbridge::config::AppConfig;
use peerbridge::ports::{Clock, DirectoryReader, PaymentGateway, PayoutLedger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Connected to PostgreSQL");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let gateway: Arc<dyn PaymentGateway> = Arc::new(StripeGateway::new(
        StripeConfig::new(
            config.payment.stripe_api_key.clone(),
            config.payment.stripe_webhook_secret.clone(),
        ),
        clock.clone(),
    ));
    let rooms = Arc::new(DailyRoomProvisioner::new(
        DailyConfig::new(config.rooms.daily_api_key.clone()),
        clock.clone(),
    ));
    let notifier = Arc::new(ResendNotifier::new(ResendConfig::new(
        config.email.resend_api_key.clone(),
        config.email.from_address.clone(),
    )));

    let sessions = Arc::new(PostgresGroupSessionRepository::new(pool.clone()));
    let participants = Arc::new(PostgresParticipantRepository::new(pool.clone()));
    let directory: Arc<dyn DirectoryReader> =
        Arc::new(PostgresDirectoryReader::new(pool.clone()));
    let payout_ledger: Arc<dyn PayoutLedger> = Arc::new(PostgresPayoutLedger::new(pool.clone()));

    let payouts = Arc::new(PayoutInitiator::new(
        gateway.clone(),
        payout_ledger.clone(),
        directory.clone(),
    ));
    let engine = Arc::new(LifecycleEngine::new(
        sessions.clone(),
        participants.clone(),
        gateway.clone(),
        rooms.clone(),
        notifier.clone(),
        directory.clone(),
        payouts,
        clock.clone(),
    ));

    let state = AppState {
        availability: Arc::new(PostgresAvailabilityRepository::new(pool.clone())),
        calls: Arc::new(PostgresCallRepository::new(pool.clone())),
        sessions,
        participants,
        purchases: Arc::new(PostgresPurchaseRepository::new(pool.clone())),
        webhook_events: Arc::new(PostgresWebhookEventRepository::new(pool.clone())),
        payout_ledger,
        gateway,
        rooms,
        notifier,
        directory,
        catalog: Arc::new(PostgresCatalogReader::new(pool)),
        clock,
        engine,
        trigger_secret: config.engine.trigger_secret.clone(),
    };

    let app = api_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.server.socket_addr();
    tracing::info!(%addr, "Peerbridge listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
