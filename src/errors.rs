use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// No token, or a token whose signature/expiry check failed.
    #[error("Unauthorized request")]
    Unauthenticated,

    /// Well-formed token whose subject no longer exists.
    #[error("Invalid token")]
    InvalidToken,

    /// Valid signature, but stale relative to the token stored for the user.
    #[error("Refresh token is expired or already used")]
    TokenReuseOrExpired,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found")]
    NotFound,

    #[error("Database error: {0}")]
    Db(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<mongodb::error::Error> for AppError {
    fn from(e: mongodb::error::Error) -> Self {
        AppError::Db(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            AppError::Validation(s) => (StatusCode::BAD_REQUEST, s.as_str()),
            AppError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthorized request"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid token"),
            AppError::TokenReuseOrExpired => (
                StatusCode::UNAUTHORIZED,
                "refresh token is expired or already used",
            ),
            AppError::Conflict(s) => (StatusCode::CONFLICT, s.as_str()),
            AppError::NotFound => (StatusCode::NOT_FOUND, "not found"),
            AppError::Db(detail) => {
                tracing::error!(%detail, "database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database error")
            }
            AppError::Internal(detail) => {
                tracing::error!(%detail, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        };

        (
            status,
            Json(json!({ "success": false, "message": msg, "errors": [] })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn envelope(err: AppError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn auth_errors_are_401() {
        for err in [
            AppError::Unauthenticated,
            AppError::InvalidToken,
            AppError::TokenReuseOrExpired,
        ] {
            let (status, _) = envelope(err).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn error_body_is_uniform_envelope() {
        let (_, body) = envelope(AppError::TokenReuseOrExpired).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "refresh token is expired or already used");
        assert!(body["errors"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn internal_detail_is_masked() {
        let (status, body) = envelope(AppError::Db("connection reset".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "database error");
    }
}
