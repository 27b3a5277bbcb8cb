//! Product catalog contract and snapshot capture.

mod http;
mod memory;

pub use http::HttpCatalogClient;
pub use memory::InMemoryCatalogClient;

use std::sync::Arc;

use async_trait::async_trait;
use common::Sku;
use domain::Snapshot;
use serde::Deserialize;

use crate::context::TenantContext;
use crate::error::CatalogError;

/// Read-only access to the product catalog.
///
/// Both calls return the raw response body; callers store it untouched.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn variant_by_sku(&self, ctx: &TenantContext, sku: &Sku)
    -> Result<Vec<u8>, CatalogError>;

    async fn product_by_id(
        &self,
        ctx: &TenantContext,
        product_id: &str,
    ) -> Result<Vec<u8>, CatalogError>;
}

#[derive(Debug, Deserialize)]
struct VariantRef {
    product_id: String,
}

/// Captures the product and variant documents of a SKU at order time.
#[derive(Clone)]
pub struct SnapshotFetcher {
    catalog: Arc<dyn CatalogClient>,
}

impl SnapshotFetcher {
    pub fn new(catalog: Arc<dyn CatalogClient>) -> Self {
        Self { catalog }
    }

    /// Returns `(product, variant)` snapshots for `sku`.
    #[tracing::instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id))]
    pub async fn fetch(
        &self,
        ctx: &TenantContext,
        sku: &Sku,
    ) -> Result<(Snapshot, Snapshot), CatalogError> {
        let variant = self.catalog.variant_by_sku(ctx, sku).await?;
        let reference: VariantRef = serde_json::from_slice(&variant).map_err(|e| {
            CatalogError::Transport(format!("variant {sku} has no readable product_id: {e}"))
        })?;
        if reference.product_id.trim().is_empty() {
            return Err(CatalogError::Transport(format!(
                "variant {sku} has an empty product_id"
            )));
        }

        let product = self
            .catalog
            .product_by_id(ctx, &reference.product_id)
            .await?;

        Ok((Snapshot::from_bytes(product), Snapshot::from_bytes(variant)))
    }
}

#[cfg(test)]
mod tests {
    use common::TenantId;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn fetch_follows_the_variant_to_its_product() {
        let catalog = InMemoryCatalogClient::new();
        catalog
            .add_variant("SKU-A", json!({"variant_sku": "SKU-A", "product_id": "p-1"}))
            .await;
        catalog
            .add_product("p-1", json!({"product_id": "p-1", "name": "Shirt"}))
            .await;

        let fetcher = SnapshotFetcher::new(Arc::new(catalog));
        let ctx = TenantContext::new(TenantId::new());
        let (product, variant) = fetcher
            .fetch(&ctx, &Sku::parse("SKU-A").unwrap())
            .await
            .unwrap();

        assert_eq!(product.as_json()["name"], "Shirt");
        assert_eq!(variant.as_json()["variant_sku"], "SKU-A");
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let catalog = InMemoryCatalogClient::new();
        catalog
            .add_variant("SKU-A", json!({"product_id": "gone"}))
            .await;

        let fetcher = SnapshotFetcher::new(Arc::new(catalog));
        let err = fetcher
            .fetch(
                &TenantContext::new(TenantId::new()),
                &Sku::parse("SKU-A").unwrap(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[tokio::test]
    async fn variant_without_product_id_is_malformed() {
        let catalog = InMemoryCatalogClient::new();
        catalog.add_variant("SKU-A", json!({"name": "x"})).await;

        let fetcher = SnapshotFetcher::new(Arc::new(catalog));
        let err = fetcher
            .fetch(
                &TenantContext::new(TenantId::new()),
                &Sku::parse("SKU-A").unwrap(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Transport(_)));
    }
}
