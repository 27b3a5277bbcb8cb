//! POS sale aggregate implementation.

use chrono::{DateTime, Utc};
use common::{CustomerId, PaymentMethodId, PosSaleId, StockEntryId, TenantId};
use serde::{Deserialize, Serialize};

use super::{DEFAULT_CURRENCY, NewPosSaleItem, PosSaleError, PosSaleItem};
use crate::Money;

/// Input for [`PosSale::new`].
#[derive(Debug, Clone)]
pub struct NewPosSale {
    pub tenant_id: TenantId,
    pub customer_id: Option<CustomerId>,
    pub payment_method_id: PaymentMethodId,
    pub items: Vec<NewPosSaleItem>,
    pub discount: Money,
    pub amount_paid: Money,
    /// Blank or absent values fall back to [`DEFAULT_CURRENCY`].
    pub currency: Option<String>,
}

/// Point-of-sale sale aggregate root.
///
/// Totals are computed once at construction:
/// `final = max(total - discount, 0)` and `change = amount_paid - final`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosSale {
    id: PosSaleId,
    tenant_id: TenantId,
    customer_id: Option<CustomerId>,
    payment_method_id: PaymentMethodId,
    total_amount: Money,
    discount_amount: Money,
    final_amount: Money,
    amount_paid: Money,
    change: Money,
    currency: String,
    items: Vec<PosSaleItem>,
    created_at: DateTime<Utc>,
}

impl PosSale {
    /// Validates the request and computes the sale totals.
    pub fn new(input: NewPosSale) -> Result<Self, PosSaleError> {
        if input.payment_method_id.as_uuid().is_nil() {
            return Err(PosSaleError::PaymentMethodRequired);
        }
        if !input.amount_paid.is_positive() {
            return Err(PosSaleError::InvalidAmountPaid);
        }
        if input.items.is_empty() {
            return Err(PosSaleError::NoItems);
        }
        if input.discount.is_negative() {
            return Err(PosSaleError::InvalidDiscount);
        }

        let id = PosSaleId::new();
        let items = input
            .items
            .into_iter()
            .map(|item| PosSaleItem::new(id, item))
            .collect::<Result<Vec<_>, _>>()?;

        let total_amount = items
            .iter()
            .try_fold(Money::zero(), |acc, item| acc.checked_add(item.subtotal()))
            .ok_or(PosSaleError::AmountOverflow)?;
        let final_amount = (total_amount - input.discount).floor_zero();

        if input.amount_paid < final_amount {
            return Err(PosSaleError::InsufficientPayment {
                amount_paid: input.amount_paid,
                final_amount,
            });
        }
        let change = input.amount_paid - final_amount;

        let currency = input
            .currency
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        Ok(Self {
            id,
            tenant_id: input.tenant_id,
            customer_id: input.customer_id,
            payment_method_id: input.payment_method_id,
            total_amount,
            discount_amount: input.discount,
            final_amount,
            amount_paid: input.amount_paid,
            change,
            currency,
            items,
            created_at: Utc::now(),
        })
    }

    /// Rebuilds a sale from storage without validation.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: PosSaleId,
        tenant_id: TenantId,
        customer_id: Option<CustomerId>,
        payment_method_id: PaymentMethodId,
        total_amount: Money,
        discount_amount: Money,
        final_amount: Money,
        amount_paid: Money,
        change: Money,
        currency: String,
        items: Vec<PosSaleItem>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            customer_id,
            payment_method_id,
            total_amount,
            discount_amount,
            final_amount,
            amount_paid,
            change,
            currency,
            items,
            created_at,
        }
    }

    /// Records the inventory entry created for the line at `line` (0-based).
    pub fn attach_stock_entry(
        &mut self,
        line: usize,
        entry: StockEntryId,
    ) -> Result<(), PosSaleError> {
        let item = self
            .items
            .get_mut(line)
            .ok_or(PosSaleError::LineOutOfRange { line })?;
        if item.stock_entry_id().is_some() {
            return Err(PosSaleError::LineAlreadySettled { line });
        }
        item.set_stock_entry(entry);
        Ok(())
    }

    /// Fails if any line has no inventory entry attached.
    pub fn ensure_settled(&self) -> Result<(), PosSaleError> {
        match self
            .items
            .iter()
            .position(|item| item.stock_entry_id().is_none())
        {
            Some(line) => Err(PosSaleError::UnsettledLine { line }),
            None => Ok(()),
        }
    }

    /// Inventory entries attached so far, in line order.
    pub fn stock_entries(&self) -> Vec<StockEntryId> {
        self.items
            .iter()
            .filter_map(PosSaleItem::stock_entry_id)
            .collect()
    }
}

// Query methods
impl PosSale {
    pub fn id(&self) -> PosSaleId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn payment_method_id(&self) -> PaymentMethodId {
        self.payment_method_id
    }

    /// Sum of line subtotals before discount.
    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn discount_amount(&self) -> Money {
        self.discount_amount
    }

    pub fn final_amount(&self) -> Money {
        self.final_amount
    }

    pub fn amount_paid(&self) -> Money {
        self.amount_paid
    }

    pub fn change(&self) -> Money {
        self.change
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn items(&self) -> &[PosSaleItem] {
        &self.items
    }

    /// Returns the number of lines.
    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use common::Sku;

    use super::*;

    fn item(sku: &str, quantity: u32, unit_price: i64) -> NewPosSaleItem {
        NewPosSaleItem {
            sku: Sku::parse(sku).unwrap(),
            product_name: None,
            quantity,
            unit_price: Money::from_cents(unit_price),
        }
    }

    fn sale(items: Vec<NewPosSaleItem>, discount: i64, paid: i64) -> NewPosSale {
        NewPosSale {
            tenant_id: TenantId::new(),
            customer_id: None,
            payment_method_id: PaymentMethodId::new(),
            items,
            discount: Money::from_cents(discount),
            amount_paid: Money::from_cents(paid),
            currency: None,
        }
    }

    #[test]
    fn test_totals_with_discount_and_change() {
        let sale = PosSale::new(sale(
            vec![item("A", 2, 10_000), item("B", 1, 5_000)],
            2_000,
            25_000,
        ))
        .unwrap();

        assert_eq!(sale.total_amount(), Money::from_cents(25_000));
        assert_eq!(sale.final_amount(), Money::from_cents(23_000));
        assert_eq!(sale.change(), Money::from_cents(2_000));
        assert_eq!(sale.items()[0].subtotal(), Money::from_cents(20_000));
        assert_eq!(sale.currency(), DEFAULT_CURRENCY);
    }

    #[test]
    fn test_discount_larger_than_total_clamps_to_zero() {
        let sale = PosSale::new(sale(vec![item("A", 1, 1_000)], 5_000, 100)).unwrap();
        assert_eq!(sale.final_amount(), Money::zero());
        assert_eq!(sale.change(), Money::from_cents(100));
    }

    #[test]
    fn test_exact_payment_has_no_change() {
        let sale = PosSale::new(sale(vec![item("A", 1, 1_000)], 0, 1_000)).unwrap();
        assert_eq!(sale.change(), Money::zero());
    }

    #[test]
    fn test_insufficient_payment() {
        let result = PosSale::new(sale(vec![item("A", 1, 1_000)], 0, 999));
        assert!(matches!(
            result,
            Err(PosSaleError::InsufficientPayment { .. })
        ));
    }

    #[test]
    fn test_line_subtotal_overflow_is_rejected() {
        let result = PosSale::new(sale(vec![item("A", 2, i64::MAX / 2 + 1)], 0, 100));
        assert!(matches!(result, Err(PosSaleError::AmountOverflow)));
    }

    #[test]
    fn test_sale_total_overflow_is_rejected() {
        let result = PosSale::new(sale(
            vec![item("A", 1, i64::MAX), item("B", 1, i64::MAX)],
            0,
            100,
        ));
        assert!(matches!(result, Err(PosSaleError::AmountOverflow)));
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            PosSale::new(sale(Vec::new(), 0, 100)),
            Err(PosSaleError::NoItems)
        ));
        assert!(matches!(
            PosSale::new(sale(vec![item("A", 1, 100)], -1, 100)),
            Err(PosSaleError::InvalidDiscount)
        ));
        assert!(matches!(
            PosSale::new(sale(vec![item("A", 1, 100)], 0, 0)),
            Err(PosSaleError::InvalidAmountPaid)
        ));
        assert!(matches!(
            PosSale::new(sale(vec![item("A", 0, 100)], 0, 100)),
            Err(PosSaleError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            PosSale::new(sale(vec![item("A", 1, -100)], 0, 100)),
            Err(PosSaleError::InvalidUnitPrice { .. })
        ));

        let mut nil_method = sale(vec![item("A", 1, 100)], 0, 100);
        nil_method.payment_method_id = PaymentMethodId::from_uuid(uuid::Uuid::nil());
        assert!(matches!(
            PosSale::new(nil_method),
            Err(PosSaleError::PaymentMethodRequired)
        ));
    }

    #[test]
    fn test_product_name_defaults_to_sku() {
        let mut named = item("B", 1, 100);
        named.product_name = Some("Blue mug".to_string());
        let sale = PosSale::new(sale(vec![item("A", 1, 100), named], 0, 200)).unwrap();
        assert_eq!(sale.items()[0].product_name(), "A");
        assert_eq!(sale.items()[1].product_name(), "Blue mug");
    }

    #[test]
    fn test_blank_currency_uses_default() {
        let mut input = sale(vec![item("A", 1, 100)], 0, 100);
        input.currency = Some("  ".to_string());
        assert_eq!(PosSale::new(input).unwrap().currency(), "ARS");

        let mut input = sale(vec![item("A", 1, 100)], 0, 100);
        input.currency = Some("USD".to_string());
        assert_eq!(PosSale::new(input).unwrap().currency(), "USD");
    }

    #[test]
    fn test_settlement() {
        let mut sale = PosSale::new(sale(vec![item("A", 1, 100), item("B", 1, 100)], 0, 200))
            .unwrap();
        assert!(matches!(
            sale.ensure_settled(),
            Err(PosSaleError::UnsettledLine { line: 0 })
        ));

        let first = StockEntryId::new();
        sale.attach_stock_entry(0, first).unwrap();
        assert!(matches!(
            sale.attach_stock_entry(0, StockEntryId::new()),
            Err(PosSaleError::LineAlreadySettled { line: 0 })
        ));
        assert!(matches!(
            sale.ensure_settled(),
            Err(PosSaleError::UnsettledLine { line: 1 })
        ));

        let second = StockEntryId::new();
        sale.attach_stock_entry(1, second).unwrap();
        sale.ensure_settled().unwrap();
        assert_eq!(sale.stock_entries(), vec![first, second]);

        assert!(matches!(
            sale.attach_stock_entry(2, StockEntryId::new()),
            Err(PosSaleError::LineOutOfRange { line: 2 })
        ));
    }
}
