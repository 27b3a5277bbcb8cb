//! POS checkout saga: build the sale, take stock line by line, persist.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{CustomerId, PaymentMethodId, PosSaleId, PosSaleItemId, StockEntryId, TenantId};
use domain::{
    DEFAULT_CURRENCY, Money, NewPosSale, NewPosSaleItem, PaymentMethodCatalog, PosSale,
};
use serde::{Deserialize, Serialize};
use store::PosSaleRepository;

use crate::compensation::{CompensationReason, Compensator};
use crate::context::TenantContext;
use crate::create_order::parse_line;
use crate::error::{Result, SagaError};
use crate::inventory::StockClient;
use crate::reference::TransactionRef;
use crate::state::{SagaRun, SagaState};
use crate::stock_lines::{StockLine, abort, sell_lines};

pub const SAGA_NAME: &str = "pos_sale";

/// Checkout request. Amounts are in minor currency units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosSaleRequest {
    #[serde(default)]
    pub customer_id: Option<String>,
    pub payment_method_id: String,
    pub items: Vec<PosSaleLineRequest>,
    #[serde(default)]
    pub discount_cents: i64,
    pub amount_paid_cents: i64,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosSaleLineRequest {
    pub sku: String,
    #[serde(default)]
    pub product_name: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosSaleItemView {
    pub item_id: PosSaleItemId,
    pub sku: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
    pub stock_entry_id: Option<StockEntryId>,
}

/// Print-ready ticket of a completed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosSaleResponse {
    pub sale_id: PosSaleId,
    pub sale_number: String,
    pub tenant_id: TenantId,
    pub customer_id: Option<CustomerId>,
    pub payment_method_id: PaymentMethodId,
    pub payment_method_name: String,
    pub items: Vec<PosSaleItemView>,
    pub total_items: usize,
    pub total_amount_cents: i64,
    pub discount_amount_cents: i64,
    pub final_amount_cents: i64,
    pub amount_paid_cents: i64,
    pub change_cents: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl PosSaleResponse {
    pub fn build(sale: &PosSale, payment_methods: &PaymentMethodCatalog) -> Self {
        Self {
            sale_id: sale.id(),
            sale_number: sale.id().to_string(),
            tenant_id: sale.tenant_id(),
            customer_id: sale.customer_id(),
            payment_method_id: sale.payment_method_id(),
            payment_method_name: payment_methods
                .name_of(sale.payment_method_id())
                .to_string(),
            items: sale
                .items()
                .iter()
                .map(|item| PosSaleItemView {
                    item_id: item.id(),
                    sku: item.sku().to_string(),
                    product_name: item.product_name().to_string(),
                    quantity: item.quantity(),
                    unit_price_cents: item.unit_price().cents(),
                    subtotal_cents: item.subtotal().cents(),
                    stock_entry_id: item.stock_entry_id(),
                })
                .collect(),
            total_items: sale.total_items(),
            total_amount_cents: sale.total_amount().cents(),
            discount_amount_cents: sale.discount_amount().cents(),
            final_amount_cents: sale.final_amount().cents(),
            amount_paid_cents: sale.amount_paid().cents(),
            change_cents: sale.change().cents(),
            currency: sale.currency().to_string(),
            created_at: sale.created_at(),
        }
    }
}

/// One row of the sales listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosSaleSummary {
    pub id: PosSaleId,
    pub customer_id: Option<CustomerId>,
    pub payment_method_id: PaymentMethodId,
    pub total_amount_cents: i64,
    pub discount_amount_cents: i64,
    pub final_amount_cents: i64,
    pub currency: String,
    pub total_items: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&PosSale> for PosSaleSummary {
    fn from(sale: &PosSale) -> Self {
        Self {
            id: sale.id(),
            customer_id: sale.customer_id(),
            payment_method_id: sale.payment_method_id(),
            total_amount_cents: sale.total_amount().cents(),
            discount_amount_cents: sale.discount_amount().cents(),
            final_amount_cents: sale.final_amount().cents(),
            currency: sale.currency().to_string(),
            total_items: sale.total_items(),
            created_at: sale.created_at(),
        }
    }
}

/// Point-of-sale checkout with client-supplied prices.
pub struct PosSaleUseCase {
    stock: Arc<dyn StockClient>,
    sales: Arc<dyn PosSaleRepository>,
    payment_methods: Arc<PaymentMethodCatalog>,
    compensator: Compensator,
    default_currency: String,
}

impl PosSaleUseCase {
    pub fn new(
        stock: Arc<dyn StockClient>,
        sales: Arc<dyn PosSaleRepository>,
        payment_methods: Arc<PaymentMethodCatalog>,
    ) -> Self {
        Self {
            compensator: Compensator::new(stock.clone()),
            stock,
            sales,
            payment_methods,
            default_currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    /// Currency applied when a request names none.
    pub fn with_default_currency(mut self, currency: impl Into<String>) -> Self {
        let currency = currency.into();
        if !currency.trim().is_empty() {
            self.default_currency = currency.trim().to_string();
        }
        self
    }

    #[tracing::instrument(skip(self, ctx, request), fields(tenant_id = %ctx.tenant_id, lines = request.items.len()))]
    pub async fn execute(
        &self,
        ctx: &TenantContext,
        request: PosSaleRequest,
    ) -> Result<PosSaleResponse> {
        let mut sale = self.build_sale(ctx, request)?;

        let mut run = SagaRun::start(SAGA_NAME, SagaState::BuildingAggregate);
        match self.run(ctx, &mut run, &mut sale).await {
            Ok(()) => {
                run.complete();
                Ok(PosSaleResponse::build(&sale, &self.payment_methods))
            }
            Err(e) => {
                run.fail(&e.to_string());
                Err(e)
            }
        }
    }

    /// Lists the tenant's sales, newest first.
    #[tracing::instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id))]
    pub async fn list(&self, ctx: &TenantContext) -> Result<Vec<PosSaleSummary>> {
        let sales = self.sales.list_by_tenant(ctx.tenant_id).await?;
        Ok(sales.iter().map(PosSaleSummary::from).collect())
    }

    /// Validates the request and builds the aggregate. No remote call is made.
    fn build_sale(&self, ctx: &TenantContext, request: PosSaleRequest) -> Result<PosSale> {
        let payment_method_id = PaymentMethodId::parse(&request.payment_method_id)?;
        let customer_id = match request.customer_id.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(CustomerId::parse(raw)?),
            _ => None,
        };
        if request.items.is_empty() {
            return Err(SagaError::Validation(
                "sale must contain at least one item".to_string(),
            ));
        }

        let items = request
            .items
            .into_iter()
            .map(|item| -> Result<NewPosSaleItem> {
                let StockLine { sku, quantity } = parse_line(&item.sku, item.quantity)?;
                Ok(NewPosSaleItem {
                    sku,
                    product_name: item.product_name,
                    quantity,
                    unit_price: Money::from_cents(item.unit_price_cents),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let currency = request
            .currency
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| self.default_currency.clone());

        let sale = PosSale::new(NewPosSale {
            tenant_id: ctx.tenant_id,
            customer_id,
            payment_method_id,
            items,
            discount: Money::from_cents(request.discount_cents),
            amount_paid: Money::from_cents(request.amount_paid_cents),
            currency: Some(currency),
        })?;
        Ok(sale)
    }

    async fn run(&self, ctx: &TenantContext, run: &mut SagaRun, sale: &mut PosSale) -> Result<()> {
        let reference = TransactionRef::for_pos_sale(sale.id());
        let lines: Vec<StockLine> = sale
            .items()
            .iter()
            .map(|item| StockLine {
                sku: item.sku().clone(),
                quantity: item.quantity(),
            })
            .collect();
        tracing::info!(sale_id = %sale.id(), %reference, final_amount = %sale.final_amount(), "sale built, processing stock");

        let entries = sell_lines(
            self.stock.as_ref(),
            &self.compensator,
            ctx,
            run,
            reference,
            &lines,
            CompensationReason::PosSaleCreationFailed,
        )
        .await?;

        let settled = entries
            .iter()
            .enumerate()
            .try_for_each(|(line, entry)| sale.attach_stock_entry(line, *entry))
            .and_then(|()| sale.ensure_settled());
        if let Err(e) = settled {
            return Err(abort(
                &self.compensator,
                ctx,
                run,
                CompensationReason::AggregateCreationFailed,
                SagaError::Internal(e.to_string()),
            )
            .await);
        }

        run.advance(SagaState::Persisting);
        if let Err(e) = self.sales.save(sale).await {
            tracing::error!(sale_id = %sale.id(), error = %e, "sale persistence failed after stock was taken");
            return Err(abort(
                &self.compensator,
                ctx,
                run,
                CompensationReason::PosSalePersistenceFailed,
                e.into(),
            )
            .await);
        }

        tracing::info!(sale_id = %sale.id(), lines = sale.total_items(), "pos sale created");
        Ok(())
    }
}
