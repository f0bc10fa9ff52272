use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use skylane_core::CoreError;

/// API-boundary error. Every variant renders as the uniform
/// `{"error":{"code","message"[,"details"]}}` envelope; upstream and
/// internal details are logged, never sent to the client.
#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    ValidationDetail(String, serde_json::Value),
    NotFoundError(String),
    UpstreamError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            AppError::AuthenticationError(msg) => {
                (StatusCode::UNAUTHORIZED, "AUTHENTICATION_FAILED", msg, None)
            }
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg, None),
            AppError::ValidationError(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg, None)
            }
            AppError::ValidationDetail(msg, details) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg,
                Some(details),
            ),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::UpstreamError(msg) => {
                tracing::error!("Upstream service error: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Service temporarily unavailable. Please try again later.".to_string(),
                    None,
                )
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal Server Error".to_string(),
                    None,
                )
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal Server Error".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message,
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => AppError::ValidationError(msg),
            CoreError::Permission(msg) => AppError::AuthorizationError(msg),
            CoreError::NotFound(msg) => AppError::NotFoundError(msg),
            CoreError::Upstream(msg) => AppError::UpstreamError(msg),
            CoreError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_error_envelope() {
        let (status, body) =
            body_json(AppError::ValidationError("Departure date cannot be in the past".into()))
                .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "Departure date cannot be in the past");
    }

    #[tokio::test]
    async fn test_upstream_detail_is_not_leaked() {
        let (status, body) =
            body_json(AppError::UpstreamError("stripe returned HTTP 500".into())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
        assert!(!body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("stripe"));
    }

    #[tokio::test]
    async fn test_permission_maps_to_forbidden_not_validation() {
        let err: AppError = CoreError::Permission("Account is pending approval".into()).into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }
}
