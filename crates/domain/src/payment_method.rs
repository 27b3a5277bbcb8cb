//! Payment methods available at the point of sale.

use std::collections::HashMap;

use common::PaymentMethodId;
use serde::{Deserialize, Serialize};

/// Name reported for payment methods missing from the catalog.
pub const UNKNOWN_PAYMENT_METHOD: &str = "Unknown";

/// A payment method accepted at the counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub code: String,
    pub name: String,
}

/// Read-only lookup of payment methods, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct PaymentMethodCatalog {
    by_id: HashMap<PaymentMethodId, PaymentMethod>,
}

impl PaymentMethodCatalog {
    pub fn new(methods: impl IntoIterator<Item = PaymentMethod>) -> Self {
        Self {
            by_id: methods.into_iter().map(|m| (m.id, m)).collect(),
        }
    }

    pub fn get(&self, id: PaymentMethodId) -> Option<&PaymentMethod> {
        self.by_id.get(&id)
    }

    /// Display name of a payment method, or `"Unknown"`.
    pub fn name_of(&self, id: PaymentMethodId) -> &str {
        self.by_id
            .get(&id)
            .map(|m| m.name.as_str())
            .unwrap_or(UNKNOWN_PAYMENT_METHOD)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_lookup_falls_back_to_unknown() {
        let cash = PaymentMethod {
            id: PaymentMethodId::new(),
            code: "CASH".to_string(),
            name: "Efectivo".to_string(),
        };
        let catalog = PaymentMethodCatalog::new([cash.clone()]);

        assert_eq!(catalog.name_of(cash.id), "Efectivo");
        assert_eq!(catalog.name_of(PaymentMethodId::new()), "Unknown");
        assert_eq!(catalog.len(), 1);
    }
}
