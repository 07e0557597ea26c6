use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// 统一的应用错误类型
#[derive(Error, Debug)]
pub enum AppError {
    #[error("配置错误: {0}")]
    Config(#[from] crate::comm::config::ConfigError),

    #[error("认证错误: {message}")]
    Auth { message: String },

    #[error("权限错误: {message}")]
    Permission { message: String },

    #[error("验证错误: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("外部服务错误: {service}: {message}")]
    ExternalService { service: String, message: String },

    #[error("诊断信息构建失败: {message}")]
    Introspection { message: String },

    #[error("内部错误: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// 创建认证错误
    pub fn auth<T: Into<String>>(message: T) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// 创建权限错误
    pub fn permission<T: Into<String>>(message: T) -> Self {
        Self::Permission {
            message: message.into(),
        }
    }

    /// 创建验证错误
    pub fn validation<T: Into<String>, U: Into<String>>(field: T, message: U) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// 创建外部服务错误
    pub fn external_service<T: Into<String>, U: Into<String>>(service: T, message: U) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    /// 创建诊断信息构建错误
    pub fn introspection<T: Into<String>>(message: T) -> Self {
        Self::Introspection {
            message: message.into(),
        }
    }

    /// 获取错误代码
    pub fn error_code(&self) -> i32 {
        match self {
            AppError::Config(_) => 1001,
            AppError::Auth { .. } => 1002,
            AppError::Permission { .. } => 1003,
            AppError::Validation { .. } => 1004,
            AppError::ExternalService { .. } => 1007,
            AppError::Introspection { .. } => 1010,
            AppError::Internal(_) => 1000,
        }
    }

    /// 错误类型名称
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "Config",
            AppError::Auth { .. } => "Auth",
            AppError::Permission { .. } => "Permission",
            AppError::Validation { .. } => "Validation",
            AppError::ExternalService { .. } => "ExternalService",
            AppError::Introspection { .. } => "Introspection",
            AppError::Internal(_) => "Internal",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth { .. } => StatusCode::UNAUTHORIZED,
            AppError::Permission { .. } => StatusCode::FORBIDDEN,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::ExternalService { .. } => StatusCode::BAD_GATEWAY,
            AppError::Introspection { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = self.to_string();

        // 记录错误日志
        match self {
            AppError::Internal(_) | AppError::Introspection { .. } | AppError::Config(_) => {
                tracing::error!("Internal error: {}", message);
            }
            AppError::ExternalService { .. } => {
                tracing::warn!("External service error: {}", message);
            }
            _ => {
                tracing::info!("Client error: {}", message);
            }
        }

        HttpResponse::build(status).json(json!({
            "success": false,
            "error": {
                "code": self.error_code(),
                "message": message,
                "type": self.kind()
            },
            "timestamp": chrono::Utc::now().to_rfc3339()
        }))
    }
}

/// 应用结果类型
pub type AppResult<T> = Result<T, AppError>;
