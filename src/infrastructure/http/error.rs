//! HTTP Error Handling
//!
//! 转换用例错误到 HTTP 状态码的映射:
//! - 校验失败 -> 400
//! - 重试耗尽 / 服务繁忙 -> 503
//! - 引擎不可用 / 其它失败 -> 500
//!
//! 响应体统一为 `{ errno, error }`，error 为简短的机器可读原因。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::ConversionError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(errno: i32, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
        }
    }
}

/// 错误码定义
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const INTERNAL_ERROR: i32 = 500;
    pub const SERVICE_UNAVAILABLE: i32 = 503;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    ServiceUnavailable(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, response) = match &self {
            ApiError::BadRequest(msg) => {
                tracing::warn!(errno = errno::BAD_REQUEST, error = %msg, "Bad request");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new(errno::BAD_REQUEST, msg.clone()),
                )
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::error!(errno = errno::SERVICE_UNAVAILABLE, error = %msg, "Service unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse::new(errno::SERVICE_UNAVAILABLE, msg.clone()),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(errno = errno::INTERNAL_ERROR, error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(errno::INTERNAL_ERROR, msg.clone()),
                )
            }
        };

        (status, Json(response)).into_response()
    }
}

impl From<ConversionError> for ApiError {
    fn from(e: ConversionError) -> Self {
        match &e {
            ConversionError::Validation(_) => ApiError::BadRequest(e.to_string()),
            ConversionError::Busy => ApiError::ServiceUnavailable(e.to_string()),
            ConversionError::SynthesisExhausted { .. } => {
                ApiError::ServiceUnavailable(e.to_string())
            }
            ConversionError::EngineUnavailable(_) | ConversionError::SynthesisFailed(_) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}
