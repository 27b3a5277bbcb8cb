//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use common::TenantId;
use saga::{TENANT_HEADER, TenantContext};

use crate::error::ApiError;

/// Caller identity from the `X-Tenant-ID` and `Authorization` headers.
///
/// The tenant header is required. The credential is optional and forwarded
/// verbatim to downstream services.
#[derive(Debug, Clone)]
pub struct Tenant(pub TenantContext);

impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(TENANT_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if raw.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "{TENANT_HEADER} header is required"
            )));
        }
        let tenant_id =
            TenantId::parse(raw).map_err(|e| ApiError::BadRequest(e.to_string()))?;

        let mut ctx = TenantContext::new(tenant_id);
        if let Some(auth) = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        {
            ctx = ctx.with_authorization(auth);
        }
        Ok(Tenant(ctx))
    }
}
