//! Inventory service client over HTTP, reached through the API gateway.

use async_trait::async_trait;
use common::{Sku, StockEntryId};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::{
    Availability, AtomicSaleResult, ConsumeResult, ReleaseResult, ReserveResult,
    RevertConsumeResult, StockClient,
};
use crate::compensation::CompensationReason;
use crate::context::TenantContext;
use crate::error::{RejectionKind, StockError};
use crate::gateway::{GatewayClient, GatewayConfig, RawResponse};

#[derive(Debug, Serialize)]
struct SaleRequest<'a> {
    variant_sku: &'a str,
    quantity: f64,
    reference: &'a str,
}

#[derive(Debug, Deserialize)]
struct SaleResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    quantity_sold: f64,
    #[serde(default)]
    remaining_stock: f64,
    #[serde(default)]
    stock_entry_id: Option<String>,
    #[serde(default)]
    error_code: Option<RejectionKind>,
}

#[derive(Debug, Serialize)]
struct CompensateRequest<'a> {
    stock_entry_id: String,
    reason: &'a str,
}

#[derive(Debug, Serialize)]
struct MovementRequest<'a> {
    sku: &'a str,
    quantity: u32,
    reference: &'a str,
}

/// [`StockClient`] backed by the inventory service's REST API.
#[derive(Debug, Clone)]
pub struct HttpStockClient {
    config: GatewayConfig,
    client: GatewayClient,
}

impl HttpStockClient {
    pub fn new(config: GatewayConfig) -> reqwest::Result<Self> {
        let client = GatewayClient::new(&config)?;
        Ok(Self { config, client })
    }

    async fn post<B: Serialize>(
        &self,
        ctx: &TenantContext,
        endpoint: &str,
        body: &B,
    ) -> Result<RawResponse, StockError> {
        let url = self.config.stock_url(endpoint);
        let builder = self.client.request(Method::POST, &url, ctx).json(body);
        self.client
            .send(builder)
            .await
            .map_err(|e| StockError::Transport(format!("POST {endpoint}: {e}")))
    }

    /// Shared handling of the reserve/release/consume/revert endpoints.
    async fn movement<T: DeserializeOwned>(
        &self,
        ctx: &TenantContext,
        endpoint: &str,
        sku: &Sku,
        quantity: u32,
        reference: &str,
        conflict: RejectionKind,
    ) -> Result<T, StockError> {
        let request = MovementRequest {
            sku: sku.as_str(),
            quantity,
            reference,
        };
        let response = self.post(ctx, endpoint, &request).await?;
        match response.status {
            StatusCode::OK => decode(&response, endpoint),
            StatusCode::CONFLICT => Err(StockError::Rejected {
                kind: conflict,
                message: response.text(),
            }),
            StatusCode::NOT_FOUND => Err(StockError::NotFound(format!("sku {sku}"))),
            status => Err(unexpected(endpoint, status, &response)),
        }
    }
}

fn decode<T: DeserializeOwned>(response: &RawResponse, endpoint: &str) -> Result<T, StockError> {
    response
        .json()
        .map_err(|e| StockError::Transport(format!("malformed {endpoint} response: {e}")))
}

fn unexpected(endpoint: &str, status: StatusCode, response: &RawResponse) -> StockError {
    StockError::Transport(format!(
        "{endpoint} returned status {}: {}",
        status.as_u16(),
        response.text()
    ))
}

#[async_trait]
impl StockClient for HttpStockClient {
    #[tracing::instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id))]
    async fn availability(
        &self,
        ctx: &TenantContext,
        sku: &Sku,
    ) -> Result<Availability, StockError> {
        let url = self.config.stock_url("availability");
        let builder = self
            .client
            .request(Method::GET, &url, ctx)
            .query(&[("sku", sku.as_str())]);
        let response = self
            .client
            .send(builder)
            .await
            .map_err(|e| StockError::Transport(format!("GET availability: {e}")))?;

        match response.status {
            StatusCode::OK => decode(&response, "availability"),
            StatusCode::NOT_FOUND => Err(StockError::NotFound(format!("sku {sku}"))),
            status => Err(unexpected("availability", status, &response)),
        }
    }

    #[tracing::instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id))]
    async fn atomic_sale(
        &self,
        ctx: &TenantContext,
        sku: &Sku,
        quantity: u32,
        reference: &str,
    ) -> Result<AtomicSaleResult, StockError> {
        let request = SaleRequest {
            variant_sku: sku.as_str(),
            quantity: f64::from(quantity),
            reference,
        };
        let response = self.post(ctx, "sale", &request).await?;
        let status = response.status;

        if status == StatusCode::NOT_FOUND {
            return Err(StockError::NotFound(format!("sku {sku}")));
        }
        let parseable = status.is_success()
            || matches!(
                status,
                StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY
            );
        if !parseable {
            return Err(unexpected("sale", status, &response));
        }

        let body: SaleResponse = match response.json() {
            Ok(body) => body,
            Err(_) if status == StatusCode::CONFLICT => {
                return Ok(AtomicSaleResult::rejected(
                    RejectionKind::InsufficientStock,
                    response.text(),
                ));
            }
            Err(e) => {
                return Err(StockError::Transport(format!(
                    "malformed sale response: {e}"
                )));
            }
        };

        if !body.success {
            let kind = body.error_code.unwrap_or(if status == StatusCode::CONFLICT {
                RejectionKind::InsufficientStock
            } else {
                RejectionKind::Other
            });
            return Ok(AtomicSaleResult::rejected(kind, body.message));
        }

        let entry = body
            .stock_entry_id
            .as_deref()
            .and_then(|raw| StockEntryId::parse(raw).ok())
            .ok_or_else(|| {
                StockError::Transport(
                    "malformed sale response: success without a valid stock_entry_id".to_string(),
                )
            })?;

        Ok(AtomicSaleResult {
            success: true,
            message: body.message,
            stock_entry_id: Some(entry),
            quantity_sold: body.quantity_sold,
            remaining_stock: body.remaining_stock,
            rejection: None,
        })
    }

    #[tracing::instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id))]
    async fn compensate(
        &self,
        ctx: &TenantContext,
        entry: StockEntryId,
        reason: CompensationReason,
    ) -> Result<(), StockError> {
        let request = CompensateRequest {
            stock_entry_id: entry.to_string(),
            reason: reason.as_str(),
        };
        let response = self.post(ctx, "compensate-sale", &request).await?;
        match response.status {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => Err(StockError::NotFound(format!("stock entry {entry}"))),
            status => Err(unexpected("compensate-sale", status, &response)),
        }
    }

    async fn reserve(
        &self,
        ctx: &TenantContext,
        sku: &Sku,
        quantity: u32,
        reference: &str,
    ) -> Result<ReserveResult, StockError> {
        self.movement(
            ctx,
            "reserve",
            sku,
            quantity,
            reference,
            RejectionKind::InsufficientStock,
        )
        .await
    }

    async fn release(
        &self,
        ctx: &TenantContext,
        sku: &Sku,
        quantity: u32,
        reference: &str,
    ) -> Result<ReleaseResult, StockError> {
        self.movement(
            ctx,
            "release",
            sku,
            quantity,
            reference,
            RejectionKind::InsufficientReservedStock,
        )
        .await
    }

    async fn consume(
        &self,
        ctx: &TenantContext,
        sku: &Sku,
        quantity: u32,
        reference: &str,
    ) -> Result<ConsumeResult, StockError> {
        self.movement(
            ctx,
            "consume",
            sku,
            quantity,
            reference,
            RejectionKind::InsufficientReservedStock,
        )
        .await
    }

    async fn revert_consume(
        &self,
        ctx: &TenantContext,
        sku: &Sku,
        quantity: u32,
        reference: &str,
    ) -> Result<RevertConsumeResult, StockError> {
        self.movement(
            ctx,
            "revert-consume",
            sku,
            quantity,
            reference,
            RejectionKind::Other,
        )
        .await
    }
}
