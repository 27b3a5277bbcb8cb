use async_trait::async_trait;
use common::Sku;
use reqwest::{Method, StatusCode, Url};

use super::CatalogClient;
use crate::context::TenantContext;
use crate::error::CatalogError;
use crate::gateway::{GatewayClient, GatewayConfig};

/// [`CatalogClient`] backed by the catalog service's REST API.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    config: GatewayConfig,
    client: GatewayClient,
}

impl HttpCatalogClient {
    pub fn new(config: GatewayConfig) -> reqwest::Result<Self> {
        let client = GatewayClient::new(&config)?;
        Ok(Self { config, client })
    }

    /// `{catalog}/api/v1/{collection}/{key}` with `key` percent-encoded.
    fn resource_url(&self, collection: &str, key: &str) -> Result<Url, CatalogError> {
        let mut url = Url::parse(&self.config.catalog_url(collection))
            .map_err(|e| CatalogError::Transport(format!("invalid catalog url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| CatalogError::Transport("catalog url cannot be a base".to_string()))?
            .push(key);
        Ok(url)
    }

    async fn get(
        &self,
        ctx: &TenantContext,
        url: Url,
        what: String,
    ) -> Result<Vec<u8>, CatalogError> {
        let builder = self.client.request(Method::GET, url.as_str(), ctx);
        let response = self
            .client
            .send(builder)
            .await
            .map_err(|e| CatalogError::Transport(format!("GET {what}: {e}")))?;

        match response.status {
            StatusCode::OK => Ok(response.body),
            StatusCode::NOT_FOUND => Err(CatalogError::NotFound(what)),
            status => Err(CatalogError::Transport(format!(
                "catalog returned status {} for {what}: {}",
                status.as_u16(),
                response.text()
            ))),
        }
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn variant_by_sku(
        &self,
        ctx: &TenantContext,
        sku: &Sku,
    ) -> Result<Vec<u8>, CatalogError> {
        let url = self.resource_url("variants/by-sku", sku.as_str())?;
        self.get(ctx, url, format!("variant {sku}")).await
    }

    async fn product_by_id(
        &self,
        ctx: &TenantContext,
        product_id: &str,
    ) -> Result<Vec<u8>, CatalogError> {
        let url = self.resource_url("products", product_id)?;
        self.get(ctx, url, format!("product {product_id}")).await
    }
}
