//! HTTP plumbing shared by the clients that go through the API gateway.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::context::TenantContext;

pub const TENANT_HEADER: &str = "X-Tenant-ID";

/// Where the gateway lives and how the downstream services are mounted on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub base_url: String,
    pub stock_path: String,
    pub catalog_path: String,
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://kong:8000".to_string(),
            stock_path: "/stock".to_string(),
            catalog_path: "/pim".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl GatewayConfig {
    /// `{base}{stock_path}/api/v1/{endpoint}`
    pub fn stock_url(&self, endpoint: &str) -> String {
        join(&self.base_url, &self.stock_path, endpoint)
    }

    /// `{base}{catalog_path}/api/v1/{endpoint}`
    pub fn catalog_url(&self, endpoint: &str) -> String {
        join(&self.base_url, &self.catalog_path, endpoint)
    }
}

fn join(base: &str, service_path: &str, endpoint: &str) -> String {
    format!(
        "{}/{}/api/v1/{}",
        base.trim_end_matches('/'),
        service_path.trim_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

/// A response read fully into memory.
#[derive(Debug)]
pub(crate) struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Body as lossy text, for error messages.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// reqwest client with the gateway timeout and tenant headers applied.
#[derive(Debug, Clone)]
pub(crate) struct GatewayClient {
    http: reqwest::Client,
}

impl GatewayClient {
    pub fn new(config: &GatewayConfig) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http })
    }

    pub fn request(&self, method: Method, url: &str, ctx: &TenantContext) -> RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header(TENANT_HEADER, ctx.tenant_id.to_string());
        match &ctx.authorization {
            Some(auth) => builder.header(reqwest::header::AUTHORIZATION, auth),
            None => builder,
        }
    }

    /// Sends the request and reads the whole body.
    pub async fn send(&self, builder: RequestBuilder) -> reqwest::Result<RawResponse> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_joined_without_double_slashes() {
        let config = GatewayConfig {
            base_url: "http://gateway:8000/".to_string(),
            stock_path: "/stock/".to_string(),
            catalog_path: "pim".to_string(),
            timeout: Duration::from_secs(1),
        };
        assert_eq!(
            config.stock_url("sale"),
            "http://gateway:8000/stock/api/v1/sale"
        );
        assert_eq!(
            config.catalog_url("/variants/by-sku/A"),
            "http://gateway:8000/pim/api/v1/variants/by-sku/A"
        );
    }

    #[test]
    fn defaults_point_at_the_gateway() {
        let config = GatewayConfig::default();
        assert_eq!(
            config.stock_url("availability"),
            "http://kong:8000/stock/api/v1/availability"
        );
        assert_eq!(config.timeout, Duration::from_secs(10));
    }
}
