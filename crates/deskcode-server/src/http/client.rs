//! Public client API: `/api/config/{code}`.

use std::net::SocketAddr;

use axum::Json;
use axum::extract::{ConnectInfo, Path, Request, State};
use axum::http::HeaderMap;
use axum::http::header::USER_AGENT;
use serde_json::{Value, json};

use super::{ApiError, AppState};
use crate::engine::ProfileSnapshot;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Caller address: first `X-Forwarded-For` hop, else the socket peer.
fn client_address(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    if let Some(addr) = forwarded {
        return addr.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default()
}

fn client_identifier(headers: &HeaderMap) -> String {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Redeem a code and return the profile it grants.
///
/// The usage record is written on a detached task after the redemption
/// has already succeeded.
pub async fn redeem(
    State(state): State<AppState>,
    Path(code): Path<String>,
    request: Request,
) -> Result<Json<ProfileSnapshot>, ApiError> {
    let snapshot = state.engine.redeem(&code).await?;

    // Detached: failures are logged inside the task.
    drop(state.engine.spawn_record_usage(
        code,
        client_address(&request),
        client_identifier(request.headers()),
    ));

    Ok(Json(snapshot))
}

/// Check a code without consuming a use.
pub async fn validate(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let snapshot = state.engine.check(&code).await?;
    Ok(Json(json!({
        "valid": true,
        "message": "config code is valid",
        "profile_name": snapshot.name,
    })))
}
