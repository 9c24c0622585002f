//! 错误到 HTTP 响应的转换
//!
//! 统一返回 `application/problem+json`，业务错误附带可操作的明细。

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use cpq_errors::AppError;
use serde_json::{Value, json};
use tracing::error;

use crate::error::QuoteError;

const PROBLEM_JSON: &str = "application/problem+json";

impl QuoteError {
    fn to_problem(&self) -> Value {
        match self {
            QuoteError::App(e) => json!(e.to_problem_details()),
            QuoteError::InvalidOverrides(violations) => {
                let mut body = json!(AppError::validation(self.to_string()).to_problem_details());
                body["violations"] = json!(violations);
                body
            }
            QuoteError::InvalidState { .. } => {
                json!(AppError::failed_precondition(self.to_string()).to_problem_details())
            }
            QuoteError::NoItemsSelected { .. } => {
                json!(AppError::validation(self.to_string()).to_problem_details())
            }
            QuoteError::ItemsNotSaved(ids) => {
                let mut body = json!(AppError::validation(self.to_string()).to_problem_details());
                body["failed_item_ids"] = json!(ids);
                body
            }
            QuoteError::AlreadyDispatched(lines) => {
                let mut body = json!(AppError::validation(self.to_string()).to_problem_details());
                body["error"] = json!(self.to_string());
                body["conflicts"] = json!(lines);
                body
            }
        }
    }
}

impl IntoResponse for QuoteError {
    fn into_response(self) -> Response {
        if let QuoteError::App(e) = &self {
            if e.is_server_error() {
                error!(error = %e, "Request failed");
            }
        }

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(self.to_problem())).into_response();
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(PROBLEM_JSON));
        response
    }
}
