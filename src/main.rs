//! Subtrack service entry point.
//!
//! Composition root: loads configuration, wires adapters to ports, and
//! serves the HTTP API.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use subtrack::adapters::email::ResendMailer;
use subtrack::adapters::http::{app_router, AppState};
use subtrack::adapters::redis::{RedisRecordStore, RedisVerificationStore};
use subtrack::adapters::stripe::{StripeConfig, StripeGateway};
use subtrack::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        environment = ?config.server.environment,
        test_mode = config.payment.is_test_mode(),
        "Starting subtrack"
    );

    // Record stores over one shared redis connection manager.
    let redis_client = redis::Client::open(config.store.redis_url.clone())?;
    let connection = redis::aio::ConnectionManager::new(redis_client).await?;
    let record_store = Arc::new(RedisRecordStore::new(connection.clone()));
    let verification_store = Arc::new(RedisVerificationStore::new(connection));

    // Processor gateway and mailer.
    let gateway = Arc::new(StripeGateway::new(StripeConfig::new(
        config.payment.stripe_api_key.clone(),
    )));
    let mailer = Arc::new(ResendMailer::new(
        config.email.resend_api_key.clone(),
        config.email.from_header(),
    ));

    let webhook_secret = if config.payment.stripe_webhook_secret.is_empty() {
        None
    } else {
        Some(SecretString::new(config.payment.stripe_webhook_secret.clone()))
    };

    let state = AppState {
        record_store,
        verification_store,
        gateway,
        mailer,
        webhook_secret,
    };

    let app = app_router(
        state,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    let addr = config.server.socket_addr();
    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
