//! Application configuration loaded from environment variables.

use std::time::Duration;

use saga::GatewayConfig;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL connection string; in-memory storage when unset
/// - `GATEWAY_URL`: API gateway base URL (default: `"http://kong:8000"`)
/// - `STOCK_SERVICE_PATH`: inventory mount point on the gateway (default: `"/stock"`)
/// - `CATALOG_SERVICE_PATH`: catalog mount point on the gateway (default: `"/pim"`)
/// - `GATEWAY_TIMEOUT_SECS`: per-request timeout (default: `10`)
/// - `DEFAULT_CURRENCY`: currency of POS sales that name none (default: `"ARS"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub gateway_url: String,
    pub stock_path: String,
    pub catalog_path: String,
    pub gateway_timeout: Duration,
    pub default_currency: String,
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: var_or("HOST", &defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: var_or("RUST_LOG", &defaults.log_level),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            gateway_url: var_or("GATEWAY_URL", &defaults.gateway_url),
            stock_path: var_or("STOCK_SERVICE_PATH", &defaults.stock_path),
            catalog_path: var_or("CATALOG_SERVICE_PATH", &defaults.catalog_path),
            gateway_timeout: std::env::var("GATEWAY_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.gateway_timeout),
            default_currency: var_or("DEFAULT_CURRENCY", &defaults.default_currency),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn gateway(&self) -> GatewayConfig {
        GatewayConfig {
            base_url: self.gateway_url.clone(),
            stock_path: self.stock_path.clone(),
            catalog_path: self.catalog_path.clone(),
            timeout: self.gateway_timeout,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let gateway = GatewayConfig::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            gateway_url: gateway.base_url,
            stock_path: gateway.stock_path,
            catalog_path: gateway.catalog_path,
            gateway_timeout: gateway.timeout,
            default_currency: domain::DEFAULT_CURRENCY.to_string(),
        }
    }
}
