use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use jetway_api::{
    app,
    state::{AppState, AuthConfig, RateLimit, Repositories},
};
use jetway_core::notifier::{LogNotifier, ReceiptNotifier};
use jetway_store::app_config::{Config, StorageBackend};
use jetway_store::database::DbClient;
use jetway_store::{EventProducer, InMemoryStore, KafkaReceiptNotifier, RedisClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "jetway_api=debug,jetway_booking=debug,jetway_catalog=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Jetway API on port {}", config.server.port);

    let repos = match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Repositories::in_memory(Arc::new(InMemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let url = config
                .database_url()
                .context("storage.backend = postgres requires database.url")?;
            let db = DbClient::new(url).await.context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            Repositories::postgres(&db)
        }
    };

    let redis = match &config.redis {
        Some(redis) => {
            let client = RedisClient::new(&redis.url)
                .await
                .context("Failed to connect to Redis")?;
            tracing::info!("Rate limiting enabled");
            Some(Arc::new(client))
        }
        None => None,
    };

    let notifier: Arc<dyn ReceiptNotifier> = match &config.kafka {
        Some(kafka) => {
            let producer = EventProducer::new(&kafka.brokers).context("Failed to create Kafka producer")?;
            Arc::new(KafkaReceiptNotifier::new(producer))
        }
        None => Arc::new(LogNotifier),
    };

    let state = AppState::new(
        repos,
        notifier,
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
        redis,
        RateLimit {
            requests: config.rate_limit.requests,
            window_seconds: config.rate_limit.window_seconds,
        },
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state).into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
