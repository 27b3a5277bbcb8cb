use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use common::Sku;
use tokio::sync::RwLock;

use super::CatalogClient;
use crate::context::TenantContext;
use crate::error::CatalogError;

#[derive(Debug, Default)]
struct CatalogState {
    variants: HashMap<String, Vec<u8>>,
    products: HashMap<String, Vec<u8>>,
    unreachable: HashSet<String>,
    lookups: usize,
}

/// In-memory catalog for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogClient {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemoryCatalogClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_variant(&self, sku: &str, document: serde_json::Value) {
        self.state
            .write()
            .await
            .variants
            .insert(sku.to_string(), document.to_string().into_bytes());
    }

    pub async fn add_product(&self, product_id: &str, document: serde_json::Value) {
        self.state
            .write()
            .await
            .products
            .insert(product_id.to_string(), document.to_string().into_bytes());
    }

    /// Registers a variant and its product in one go.
    pub async fn add_sku(&self, sku: &str, name: &str) {
        let product_id = format!("prod-{sku}");
        self.add_variant(
            sku,
            serde_json::json!({ "variant_sku": sku, "product_id": product_id }),
        )
        .await;
        self.add_product(
            &product_id,
            serde_json::json!({ "product_id": product_id, "name": name }),
        )
        .await;
    }

    /// Makes variant lookups of `sku` fail with a transport error.
    pub async fn make_unreachable(&self, sku: &str) {
        self.state.write().await.unreachable.insert(sku.to_string());
    }

    /// Number of catalog calls served so far.
    pub async fn lookups(&self) -> usize {
        self.state.read().await.lookups
    }
}

#[async_trait]
impl CatalogClient for InMemoryCatalogClient {
    async fn variant_by_sku(
        &self,
        _ctx: &TenantContext,
        sku: &Sku,
    ) -> Result<Vec<u8>, CatalogError> {
        let mut state = self.state.write().await;
        state.lookups += 1;
        if state.unreachable.contains(sku.as_str()) {
            return Err(CatalogError::Transport(format!("catalog unreachable for {sku}")));
        }
        state
            .variants
            .get(sku.as_str())
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("variant {sku}")))
    }

    async fn product_by_id(
        &self,
        _ctx: &TenantContext,
        product_id: &str,
    ) -> Result<Vec<u8>, CatalogError> {
        let mut state = self.state.write().await;
        state.lookups += 1;
        state
            .products
            .get(product_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("product {product_id}")))
    }
}
