//! Persistence for the sales service.
//!
//! Repositories are traits so the sagas can run against PostgreSQL in
//! production and against the in-memory implementations in tests.

pub mod error;
pub mod memory;
pub mod page;
pub mod postgres;
pub mod repository;

pub use error::{Result, StoreError};
pub use memory::{InMemoryOrderRepository, InMemoryPaymentMethodSource, InMemoryPosSaleRepository};
pub use page::{Page, PageRequest};
pub use postgres::{
    PostgresOrderRepository, PostgresPaymentMethodSource, PostgresPosSaleRepository,
    run_migrations,
};
pub use repository::{OrderRepository, PaymentMethodSource, PosSaleRepository};
