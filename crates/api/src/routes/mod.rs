pub mod health;
pub mod metrics;
pub mod orders;
pub mod pos;
pub mod stock;

use common::OrderId;

use crate::error::ApiError;

pub(crate) fn parse_order_id(raw: &str) -> Result<OrderId, ApiError> {
    OrderId::parse(raw).map_err(|e| ApiError::BadRequest(e.to_string()))
}
