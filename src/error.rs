//! 错误处理模块
//!
//! 定义应用程序的错误类型和错误处理逻辑。

use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::predictor::PredictError;

/// 字段级校验错误：字段名 -> 错误消息
pub type FieldErrors = BTreeMap<String, String>;

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 数据库错误
    #[error("数据库错误: {0}")]
    Database(String),

    /// 连接错误
    #[error("连接错误: {0}")]
    Connection(String),

    /// 字段验证错误（逐字段消息）
    #[error("参数验证失败: {} 个字段无效", .0.len())]
    InvalidFields(FieldErrors),

    /// 历史记录缺失必需的数值字段
    #[error("历史记录格式错误: {0}")]
    MalformedObservation(#[from] PredictError),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(String),
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

#[cfg(feature = "surrealdb")]
impl From<surrealdb::Error> for AppError {
    fn from(e: surrealdb::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

/// Axum response implementation for AppError
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = (&self).into();
        let body = ErrorResponse::new(&code, &self.to_string());
        let body = match self {
            AppError::InvalidFields(errors) => body.with_errors(errors),
            AppError::MalformedObservation(_) => body.with_details(
                "stored entries must carry finite avg_glucose, glucose_sd, difficulty and score",
            ),
            _ => body,
        };
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(body),
        )
            .into_response()
    }
}

/// 错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,
    /// 错误消息
    pub message: String,
    /// 详细信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// 逐字段错误
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: FieldErrors,
}

impl ErrorResponse {
    /// 创建新错误响应
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
            errors: FieldErrors::new(),
        }
    }

    /// 添加详细信息
    pub fn with_details(mut self, details: &str) -> Self {
        self.details = Some(details.to_string());
        self
    }

    /// 添加字段错误
    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = errors;
        self
    }
}

/// HTTP 状态码映射
impl From<&AppError> for (u16, String) {
    fn from(err: &AppError) -> (u16, String) {
        match err {
            AppError::InvalidFields(_) => (400, "BAD_REQUEST".to_string()),
            AppError::Connection(_) => (503, "SERVICE_UNAVAILABLE".to_string()),
            AppError::MalformedObservation(_) => (500, "MALFORMED_OBSERVATION".to_string()),
            AppError::Database(_) => (500, "INTERNAL_ERROR".to_string()),
            _ => (500, "INTERNAL_ERROR".to_string()),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let (status, code) = (&AppError::InvalidFields(FieldErrors::new())).into();
        assert_eq!(status, 400);
        assert_eq!(code, "BAD_REQUEST");

        let (status, code) = (&AppError::Connection("refused".into())).into();
        assert_eq!(status, 503);
        assert_eq!(code, "SERVICE_UNAVAILABLE");

        let malformed = AppError::from(PredictError::MalformedObservation {
            index: 2,
            field: "score",
        });
        let (status, code) = (&malformed).into();
        assert_eq!(status, 500);
        assert_eq!(code, "MALFORMED_OBSERVATION");
    }

    #[tokio::test]
    async fn test_invalid_fields_response_carries_messages() {
        let mut errors = FieldErrors::new();
        errors.insert("score".into(), "Score must be a number.".into());

        let response = AppError::InvalidFields(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.code, "BAD_REQUEST");
        assert_eq!(body.errors["score"], "Score must be a number.");
    }
}
