//! HTTP API of the sales service.
//!
//! Exposes order creation, POS checkout, the order lifecycle and the
//! reservation endpoints, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::PaymentMethodCatalog;
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{
    CatalogClient, CreateOrderUseCase, EventPublisher, OrderLifecycle, OrderQueries,
    PosSaleUseCase, StockClient, StockOperations,
};
use store::{OrderRepository, PaymentMethodSource, PosSaleRepository};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Collaborators the use cases are built from.
pub struct Services {
    pub stock: Arc<dyn StockClient>,
    pub catalog: Arc<dyn CatalogClient>,
    pub orders: Arc<dyn OrderRepository>,
    pub sales: Arc<dyn PosSaleRepository>,
    pub payment_methods: PaymentMethodCatalog,
    pub publisher: Arc<dyn EventPublisher>,
}

/// Shared application state.
pub struct AppState {
    pub create_order: Arc<CreateOrderUseCase>,
    pub pos_sale: Arc<PosSaleUseCase>,
    pub lifecycle: Arc<OrderLifecycle>,
    pub queries: Arc<OrderQueries>,
    pub stock_ops: Arc<StockOperations>,
}

impl AppState {
    pub fn new(services: Services, default_currency: &str) -> Self {
        let Services {
            stock,
            catalog,
            orders,
            sales,
            payment_methods,
            publisher,
        } = services;

        Self {
            create_order: Arc::new(CreateOrderUseCase::new(
                stock.clone(),
                catalog,
                orders.clone(),
            )),
            pos_sale: Arc::new(
                PosSaleUseCase::new(stock.clone(), sales, Arc::new(payment_methods))
                    .with_default_currency(default_currency),
            ),
            lifecycle: Arc::new(OrderLifecycle::new(
                stock.clone(),
                orders.clone(),
                publisher,
            )),
            queries: Arc::new(OrderQueries::new(orders)),
            stock_ops: Arc::new(StockOperations::new(stock)),
        }
    }
}

/// Loads the payment method catalog once at startup.
///
/// A failing source leaves the catalog empty; sales still go through and
/// report the method as unknown.
pub async fn load_payment_methods(source: &dyn PaymentMethodSource) -> PaymentMethodCatalog {
    match source.load_active().await {
        Ok(methods) => {
            tracing::info!(count = methods.len(), "payment methods loaded");
            PaymentMethodCatalog::new(methods)
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to load payment methods, continuing with an empty catalog");
            PaymentMethodCatalog::default()
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    let api = Router::new()
        .route(
            "/orders",
            post(routes::orders::create).get(routes::orders::list),
        )
        .route("/orders/validate-stock", post(routes::stock::validate))
        .route("/orders/reserve-stock", post(routes::stock::reserve))
        .route("/orders/release-stock", post(routes::stock::release))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/orders/{id}/confirm", post(routes::orders::confirm))
        .route("/orders/{id}/cancel", post(routes::orders::cancel))
        .route("/pos/sale", post(routes::pos::create))
        .route("/pos/sales", get(routes::pos::list));

    Router::new()
        .route("/health", get(routes::health::check))
        .nest("/api/v1", api)
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
