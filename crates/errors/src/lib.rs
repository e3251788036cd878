//! armature-errors - 统一错误处理
//!
//! 配置错误在启动期是致命的，连接错误分为可重试与终止两类，
//! 请求路径错误以结构化 envelope 返回给调用方

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Connection retry limit exceeded for [{context}] after {attempts} attempts")]
    RetryExceeded { context: String, attempts: u32 },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Initial script [{path}] failed: {detail}")]
    Script { path: String, detail: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn retry_exceeded(context: impl Into<String>, attempts: u32) -> Self {
        Self::RetryExceeded {
            context: context.into(),
            attempts,
        }
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    pub fn script(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Script {
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// 稳定的机器可读错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "ERR_CONFIG",
            Self::Connection(_) => "ERR_CONNECTION",
            Self::RetryExceeded { .. } => "ERR_RETRY_EXCEEDED",
            Self::Database(_) => "ERR_DATABASE",
            Self::Cache(_) => "ERR_CACHE",
            Self::Script { .. } => "ERR_INITIAL_SCRIPT",
            Self::NotFound(_) => "ERR_NOT_FOUND",
            Self::Validation(_) => "ERR_VALIDATION",
            Self::Internal(_) => "ERR_INTERNAL",
        }
    }

    /// 转换为 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Config(_) => 500,
            Self::Connection(_) => 503,
            Self::RetryExceeded { .. } => 503,
            Self::Database(_) => 500,
            Self::Cache(_) => 500,
            Self::Script { .. } => 500,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// 转换为响应 envelope
    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code().to_string(),
            message: self.to_string(),
            fields: None,
        }
    }
}

/// 返回给调用方的结构化错误 envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Map<String, Value>>,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            fields: None,
        }
    }

    /// 附加字段明细
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_error_body())).into_response()
    }
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::not_found("x").status_code(), 404);
        assert_eq!(AppError::validation("x").status_code(), 400);
        assert_eq!(AppError::connection("x").status_code(), 503);
        assert_eq!(AppError::retry_exceeded("pg1", 30).status_code(), 503);
        assert_eq!(AppError::internal("x").status_code(), 500);
    }

    #[test]
    fn test_retry_exceeded_message() {
        let err = AppError::retry_exceeded("pg1", 30);
        assert_eq!(
            err.to_string(),
            "Connection retry limit exceeded for [pg1] after 30 attempts"
        );
        assert_eq!(err.code(), "ERR_RETRY_EXCEEDED");
    }

    #[test]
    fn test_error_body_fields() {
        let body = ErrorBody::new("ERR_VALIDATION", "port is invalid")
            .with_field("port", Value::from(-1));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], "ERR_VALIDATION");
        assert_eq!(json["fields"]["port"], -1);
    }

    #[test]
    fn test_error_body_omits_empty_fields() {
        let json = serde_json::to_value(AppError::cache("boom").to_error_body()).unwrap();
        assert!(json.get("fields").is_none());
    }
}
