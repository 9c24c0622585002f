//! 租户提取器

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use cpq_common::TenantId;
use cpq_errors::AppError;

use crate::error::QuoteError;

pub const TENANT_HEADER: &str = "x-tenant-id";

/// 从 `x-tenant-id` 请求头解析租户
#[derive(Debug, Clone)]
pub struct Tenant(pub TenantId);

impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(TENANT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| reject(format!("Missing {} header", TENANT_HEADER)))?;

        let tenant_id: TenantId = raw
            .parse()
            .map_err(|_| reject(format!("Invalid {} header: {}", TENANT_HEADER, raw)))?;

        if tenant_id.is_nil() {
            return Err(reject(format!("Invalid {} header: nil tenant", TENANT_HEADER)));
        }

        Ok(Tenant(tenant_id))
    }
}

fn reject(msg: String) -> Response {
    QuoteError::from(AppError::validation(msg)).into_response()
}
