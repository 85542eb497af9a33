use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Failure taxonomy shared by every handler. Each variant maps to a fixed
/// HTTP status and renders as the standard JSON envelope.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Internal(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m),
            ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        let body = ApiResponse::<()> {
            success: false,
            error: true,
            message: Some(message),
            data: None,
        };
        (status, Json(body)).into_response()
    }
}

/// JSON envelope every endpoint responds with:
/// `{success, error, message?, data?}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            error: false,
            message: None,
            data: Some(data),
        })
    }

    pub fn message_data(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            error: false,
            message: Some(message.into()),
            data: Some(data),
        })
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            error: false,
            message: Some(message.into()),
            data: None,
        })
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_skips_absent_fields() {
        let body = ApiResponse::data(serde_json::json!({"id": 1}));
        let json = serde_json::to_string(&body.0).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"error\":false"));
        assert!(!json.contains("message"));
        assert!(json.contains("\"data\":{\"id\":1}"));
    }

    #[test]
    fn message_only_envelope() {
        let body = ApiResponse::message("Logout successfully");
        let json = serde_json::to_string(&body.0).unwrap();
        assert!(json.contains("Logout successfully"));
        assert!(!json.contains("data"));
    }

    #[test]
    fn error_envelope_shape() {
        let resp = ApiError::BadRequest("Insufficient stock".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let resp = ApiError::NotFound("Order not found".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
