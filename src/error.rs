/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - service 層のエラー (RoleAdminError / IdentityError) を統一的に変換
 *
 * Notes
 * - access filter の認可失敗はエラーではなく redirect (ここは通らない)
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::identity::IdentityError;
use crate::services::roles::RoleAdminError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("forbidden")]
    Forbidden,
    #[error("failed to update role")]
    MutationFailed,
    #[error("identity provider unavailable")]
    Upstream,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", "not authorized".into()),
            AppError::MutationFailed => (
                StatusCode::BAD_GATEWAY,
                "MUTATION_FAILED",
                "failed to update role".into(),
            ),
            AppError::Upstream => (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "identity provider unavailable".into(),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<RoleAdminError> for AppError {
    fn from(e: RoleAdminError) -> Self {
        match e {
            RoleAdminError::Unauthorized => AppError::Forbidden,
            RoleAdminError::InvalidRequest(message) => {
                AppError::bad_request("INVALID_ROLE_ASSIGNMENT", message)
            }
            // Upstream detail is logged by the service; the client gets a generic message.
            RoleAdminError::MutationFailed { .. } => AppError::MutationFailed,
        }
    }
}

impl From<IdentityError> for AppError {
    fn from(e: IdentityError) -> Self {
        tracing::warn!(error = %e, "identity provider call failed");
        match e {
            IdentityError::InvalidConfig(_) => AppError::Internal,
            _ => AppError::Upstream,
        }
    }
}
