use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use staffing_backend::{
    config::{get_config, init_config, LogFormat},
    database::pool::{create_pool, run_migrations},
    routes,
    services::notification_service::{
        EventDelivery, LogDelivery, NotificationService, NotificationWorker, WebhookDelivery,
    },
    store::{InMemoryStore, LifecycleStore, PgStore},
    AppState,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config();
    init_tracing(config.log_format);

    let store: Arc<dyn LifecycleStore> = match config.database_url {
        Some(_) => {
            let pool = create_pool().await?;
            run_migrations(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, running on the in-memory store");
            Arc::new(InMemoryStore::new())
        }
    };

    let (notification_service, receiver) = NotificationService::channel();
    let delivery: Arc<dyn EventDelivery> = match &config.analytics_webhook_url {
        Some(url) => {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()?;
            info!("Delivering lifecycle events to {}", url);
            Arc::new(WebhookDelivery::new(
                client,
                url.clone(),
                config.analytics_signing_secret.clone(),
            ))
        }
        None => Arc::new(LogDelivery),
    };
    tokio::spawn(
        NotificationWorker::new(receiver, delivery, config.notification_max_attempts).run(),
    );

    let app_state = AppState::new(store, notification_service);

    let app = routes::api_router()
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
