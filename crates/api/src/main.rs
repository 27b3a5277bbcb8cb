//! API server entry point.

use std::sync::Arc;

use api::config::Config;
use api::{AppState, Services};
use saga::{HttpCatalogClient, HttpStockClient, TracingEventPublisher};
use sqlx::postgres::PgPoolOptions;
use store::{
    InMemoryOrderRepository, InMemoryPaymentMethodSource, InMemoryPosSaleRepository,
    OrderRepository, PaymentMethodSource, PosSaleRepository, PostgresOrderRepository,
    PostgresPaymentMethodSource, PostgresPosSaleRepository,
};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

type Repositories = (
    Arc<dyn OrderRepository>,
    Arc<dyn PosSaleRepository>,
    Box<dyn PaymentMethodSource>,
);

async fn repositories(config: &Config) -> Repositories {
    match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .expect("failed to connect to PostgreSQL");
            store::run_migrations(&pool)
                .await
                .expect("failed to run migrations");
            tracing::info!("using PostgreSQL storage");
            (
                Arc::new(PostgresOrderRepository::new(pool.clone())),
                Arc::new(PostgresPosSaleRepository::new(pool.clone())),
                Box::new(PostgresPaymentMethodSource::new(pool)),
            )
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage");
            (
                Arc::new(InMemoryOrderRepository::new()),
                Arc::new(InMemoryPosSaleRepository::new()),
                Box::new(InMemoryPaymentMethodSource::default()),
            )
        }
    }
}

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Load configuration and wire collaborators
    let config = Config::from_env();
    let (orders, sales, payment_source) = repositories(&config).await;
    let payment_methods = api::load_payment_methods(payment_source.as_ref()).await;

    let gateway = config.gateway();
    tracing::info!(gateway = %gateway.base_url, "remote services configured");
    let stock = HttpStockClient::new(gateway.clone()).expect("failed to build inventory client");
    let catalog = HttpCatalogClient::new(gateway).expect("failed to build catalog client");

    let state = Arc::new(AppState::new(
        Services {
            stock: Arc::new(stock),
            catalog: Arc::new(catalog),
            orders,
            sales,
            payment_methods,
            publisher: Arc::new(TracingEventPublisher),
        },
        &config.default_currency,
    ));

    // 4. Build the application and serve
    let app = api::create_app(state, metrics_handle);
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
