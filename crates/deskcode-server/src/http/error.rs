//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::engine::EngineError;
use crate::settings::SettingsError;

/// Message returned for every cryptographic rejection.
const INVALID_CODE_MESSAGE: &str = "invalid code";

/// Error type returned by HTTP handlers. Rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl From<SettingsError> for ApiError {
    fn from(e: SettingsError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Internal(msg) => {
                error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            Self::Engine(e) if e.is_crypto_failure() => {
                (StatusCode::BAD_REQUEST, INVALID_CODE_MESSAGE.to_string())
            }
            Self::Engine(e) => match e {
                EngineError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
                EngineError::Expired | EngineError::UsageLimitExceeded => {
                    (StatusCode::GONE, e.to_string())
                }
                EngineError::ProfileUnavailable | EngineError::ProfileInUse(_) => {
                    (StatusCode::CONFLICT, e.to_string())
                }
                EngineError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                EngineError::GenerationExhausted(_) => {
                    error!(error = %e, "Config code generation exhausted");
                    (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
                }
                _ => {
                    error!(error = %e, "Engine failure");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal server error".to_string(),
                    )
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DatabaseError;

    fn status_of(e: EngineError) -> StatusCode {
        ApiError::from(e).status_and_message().0
    }

    #[test]
    fn business_failures_map_to_distinct_statuses() {
        assert_eq!(status_of(EngineError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(EngineError::Expired), StatusCode::GONE);
        assert_eq!(status_of(EngineError::UsageLimitExceeded), StatusCode::GONE);
        assert_eq!(status_of(EngineError::ProfileUnavailable), StatusCode::CONFLICT);
        assert_eq!(status_of(EngineError::ProfileInUse(2)), StatusCode::CONFLICT);
        assert_eq!(
            status_of(EngineError::GenerationExhausted(10)),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn crypto_failures_share_one_message() {
        let messages: Vec<_> = [
            EngineError::AuthenticationFailed,
            EngineError::TruncatedInput,
            EngineError::InvalidCode,
        ]
        .into_iter()
        .map(|e| ApiError::from(e).status_and_message())
        .collect();

        for (status, message) in &messages {
            assert_eq!(*status, StatusCode::BAD_REQUEST);
            assert_eq!(message, INVALID_CODE_MESSAGE);
        }
    }

    #[test]
    fn store_errors_are_opaque() {
        let (status, message) =
            ApiError::from(EngineError::Store(DatabaseError::Query("disk I/O".into())))
                .status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!message.contains("disk"));
    }
}
