use secrecy::ExposeSecret;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use event_registration::api::{self, state::AppState};
use event_registration::config::Config;
use event_registration::db;
use event_registration::jobs::scheduler;
use event_registration::services::payment_gateway::{
    GatewaySession, GatewaySettings, PaymentGateway, PaymentGatewayClient,
};
use event_registration::services::tokens::TokenIssuer;
use event_registration::store::{AttendeeRepository, PgStore, ProfileRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "event_registration=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting event registration server...");

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    if config.jwt_secret.expose_secret().is_empty() {
        anyhow::bail!("jwt_secret must not be empty");
    }

    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    let store = Arc::new(PgStore::new(pool));
    let attendees: Arc<dyn AttendeeRepository> = store.clone();
    let profiles: Arc<dyn ProfileRepository> = store;

    let settings = GatewaySettings::from_config(&config)?;
    let gateway_configured = settings.is_configured();
    if !gateway_configured {
        tracing::warn!("Payment gateway credentials incomplete; registrations will fail");
    }
    let session = Arc::new(GatewaySession::new(settings)?);
    let gateway: Arc<dyn PaymentGateway> = Arc::new(PaymentGatewayClient::new(session));

    let state = AppState::new(
        attendees.clone(),
        profiles,
        gateway.clone(),
        TokenIssuer::new(config.jwt_secret.clone()),
        gateway_configured,
    );

    let mut reconciliation =
        scheduler::start_reconciliation(&config.reconciliation_schedule, attendees, gateway)
            .await
            .map_err(|e| anyhow::anyhow!("failed to start reconciliation scheduler: {e:?}"))?;

    let app = api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = reconciliation.shutdown().await {
        tracing::error!(error = ?e, "Reconciliation scheduler did not shut down cleanly");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, cleaning up...");
}
