use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::mail::MailError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or malformed request fields. Nothing was sent.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// No template exists for the requested audience/kind. Nothing was sent.
    #[error("Template error: {0}")]
    Template(String),

    /// The SMTP provider could not be reached or refused the message.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Template(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Delivery(_) | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn summary(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "郵件請求格式錯誤",
            AppError::Template(_) => "不支援的通知類型",
            AppError::Delivery(_) => "郵件發送失敗",
            AppError::InternalError(_) => "伺服器內部錯誤",
        }
    }

    fn details(&self) -> &str {
        match self {
            AppError::Validation(msg)
            | AppError::Template(msg)
            | AppError::Delivery(msg)
            | AppError::InternalError(msg) => msg,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = Json(json!({
            "success": false,
            "error": self.summary(),
            "details": self.details(),
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<MailError> for AppError {
    fn from(err: MailError) -> Self {
        match err {
            MailError::Config(msg) => AppError::InternalError(msg),
            other => AppError::Delivery(other.to_string()),
        }
    }
}

impl From<askama::Error> for AppError {
    fn from(err: askama::Error) -> Self {
        AppError::InternalError(format!("Template rendering failed: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
