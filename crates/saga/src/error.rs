//! Saga error types.

use common::IdError;
use domain::{DomainError, OrderError, PosSaleError};
use serde::{Deserialize, Serialize};
use store::StoreError;
use thiserror::Error;

/// Why the inventory service declined a request.
///
/// Set where the inventory response is decoded; never inferred from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionKind {
    InsufficientStock,
    InsufficientReservedStock,
    StockNotInitialized,
    #[serde(other)]
    Other,
}

impl RejectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionKind::InsufficientStock => "insufficient_stock",
            RejectionKind::InsufficientReservedStock => "insufficient_reserved_stock",
            RejectionKind::StockNotInitialized => "stock_not_initialized",
            RejectionKind::Other => "stock_rejected",
        }
    }
}

impl std::fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors at the inventory service boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StockError {
    /// Network failure, timeout, unexpected status or undecodable body.
    #[error("inventory transport error: {0}")]
    Transport(String),

    /// The inventory service declined the operation.
    #[error("inventory rejected request ({kind}): {message}")]
    Rejected { kind: RejectionKind, message: String },

    /// The SKU or stock entry does not exist.
    #[error("inventory resource not found: {0}")]
    NotFound(String),
}

/// Errors at the catalog service boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("catalog transport error: {0}")]
    Transport(String),

    #[error("catalog resource not found: {0}")]
    NotFound(String),
}

/// Errors returned by the use cases.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Bad input, rejected before any remote call.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A remote participant declined; nothing is left to undo.
    #[error("stock rejected for SKU {sku} ({kind}): {message}")]
    Rejected {
        kind: RejectionKind,
        sku: String,
        message: String,
    },

    /// A remote participant could not be reached or answered garbage.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The order is not in the status the transition requires.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Local store failure.
    #[error("persistence error: {0}")]
    Persistence(StoreError),

    /// A broken internal invariant.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SagaError {
    /// Maps an inventory error for the line with the given SKU.
    pub fn from_stock(sku: impl Into<String>, error: StockError) -> Self {
        match error {
            StockError::Transport(message) => SagaError::Transport(message),
            StockError::Rejected { kind, message } => SagaError::Rejected {
                kind,
                sku: sku.into(),
                message,
            },
            StockError::NotFound(what) => SagaError::NotFound(what),
        }
    }

    /// True for declines by a remote participant.
    pub fn is_rejection(&self) -> bool {
        matches!(self, SagaError::Rejected { .. })
    }
}

impl From<CatalogError> for SagaError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::Transport(message) => SagaError::Transport(message),
            CatalogError::NotFound(what) => SagaError::NotFound(what),
        }
    }
}

impl From<StoreError> for SagaError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { entity, id } => SagaError::NotFound(format!("{entity} {id}")),
            StoreError::StatusConflict { .. } => SagaError::Precondition(error.to_string()),
            other => SagaError::Persistence(other),
        }
    }
}

impl From<IdError> for SagaError {
    fn from(error: IdError) -> Self {
        SagaError::Validation(error.to_string())
    }
}

impl From<OrderError> for SagaError {
    fn from(error: OrderError) -> Self {
        match error {
            OrderError::InvalidStateTransition { .. } => {
                SagaError::Precondition(error.to_string())
            }
            other => SagaError::Validation(other.to_string()),
        }
    }
}

impl From<PosSaleError> for SagaError {
    fn from(error: PosSaleError) -> Self {
        SagaError::Validation(error.to_string())
    }
}

impl From<DomainError> for SagaError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Order(e) => e.into(),
            DomainError::PosSale(e) => e.into(),
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
