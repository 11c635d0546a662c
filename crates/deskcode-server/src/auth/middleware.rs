//! Bearer-token guard for admin routes.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::http::{ApiError, AppState};

/// Axum middleware requiring `Authorization: Bearer <jwt>`.
///
/// On success the [`AdminIdentity`](super::AdminIdentity) is inserted into
/// the request extensions.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let Some(token) = token else {
        return ApiError::Unauthorized.into_response();
    };

    let identity = match state.jwt.validate(token) {
        Ok(claims) => claims.identity(),
        Err(e) => {
            debug!(error = %e, "Rejected admin token");
            None
        }
    };

    match identity {
        Some(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        None => ApiError::Unauthorized.into_response(),
    }
}
