//! Distributed sagas of the sales service.
//!
//! Order creation and POS checkout take stock from the inventory service
//! with one atomic sale per line, then persist the aggregate locally. There
//! is no distributed transaction: when a later step fails, every stock
//! entry created so far is compensated, in creation order.
//!
//! ```text
//! FetchingSnapshots -> BuildingAggregate -> ProcessingStock(1..N) -> Persisting -> Done
//!                                  any failure -> Compensating -> Failed
//! ```
//!
//! Confirm and cancel move already persisted orders forward with the legacy
//! consume and revert-consume primitives.

pub mod catalog;
pub mod compensation;
pub mod context;
pub mod create_order;
pub mod error;
pub mod events;
pub mod gateway;
pub mod inventory;
pub mod lifecycle;
pub mod pos_sale;
pub mod queries;
pub mod reference;
pub mod state;
pub mod stock_ops;
mod stock_lines;

pub use catalog::{CatalogClient, HttpCatalogClient, InMemoryCatalogClient, SnapshotFetcher};
pub use compensation::{CompensationReason, CompensationReport, Compensator};
pub use context::TenantContext;
pub use create_order::{
    CreateOrderRequest, CreateOrderResponse, CreateOrderUseCase, CreatedOrderItem,
    OrderLineRequest,
};
pub use error::{CatalogError, RejectionKind, Result, SagaError, StockError};
pub use events::{
    EventEnvelope, EventPublisher, InMemoryEventPublisher, PublishError, TracingEventPublisher,
};
pub use gateway::{GatewayConfig, TENANT_HEADER};
pub use inventory::{
    AtomicSaleResult, Availability, CompensationCall, HttpStockClient, InMemoryStockClient,
    MovementCall, MovementKind, SaleCall, StockClient,
};
pub use lifecycle::{OrderLifecycle, OrderTransitionResponse};
pub use pos_sale::{
    PosSaleItemView, PosSaleLineRequest, PosSaleRequest, PosSaleResponse, PosSaleSummary,
    PosSaleUseCase,
};
pub use queries::{OrderItemView, OrderListResponse, OrderQueries, OrderView};
pub use reference::TransactionRef;
pub use state::{SagaRun, SagaState};
pub use stock_ops::{
    ReleaseStockRequest, ReleaseStockResponse, ReserveStockResponse, ReservedLine,
    StockLineRequest, StockLinesRequest, StockOperations, ValidateStockResponse, ValidatedLine,
};
