//! Login, health and `/admin/system/*` handlers.

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument, warn};

use super::dto::{LoginBody, LoginView, StatusView, to_datetime};
use super::{ApiError, AppState};
use crate::auth::password;
use crate::engine::EngineError;
use crate::settings::{SystemSettings, SystemSettingsDto};
use crate::storage::DatabaseError;

pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

#[instrument(skip_all, fields(username = %body.username))]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<LoginView>, ApiError> {
    let user = match state.engine.db().get_admin_user_by_username(&body.username).await {
        Ok(user) => user,
        Err(DatabaseError::NotFound(_)) => {
            password::verify_unknown_account(&body.password);
            warn!("Failed login attempt");
            return Err(ApiError::Unauthorized);
        }
        Err(e) => return Err(EngineError::from(e).into()),
    };

    let valid = password::verify_password(&body.password, &user.password_hash)
        .map_err(|e| ApiError::Internal(format!("password verification failed: {e}")))?;
    if !valid {
        warn!("Failed login attempt");
        return Err(ApiError::Unauthorized);
    }

    let ttl = state.settings.snapshot().await.token_ttl_secs();
    let (token, exp) = state
        .jwt
        .issue_access_token(user.id, &user.username, ttl)
        .map_err(|e| ApiError::Internal(format!("token creation failed: {e}")))?;

    info!(admin_id = user.id, "Admin logged in");
    Ok(Json(LoginView {
        token,
        username: user.username,
        expires_at: to_datetime(exp),
    }))
}

pub async fn get_config(State(state): State<AppState>) -> Json<SystemSettingsDto> {
    Json(SystemSettingsDto::from(&state.settings.snapshot().await))
}

#[instrument(skip_all)]
pub async fn update_config(
    State(state): State<AppState>,
    Json(body): Json<SystemSettingsDto>,
) -> Result<Json<SystemSettingsDto>, ApiError> {
    let next = SystemSettings::try_from(body)?;
    let view = SystemSettingsDto::from(&next);
    state.settings.replace(next).await;
    info!("audit: system.config.update");
    Ok(Json(view))
}

pub async fn status(State(state): State<AppState>) -> Json<StatusView> {
    let uptime = std::time::Duration::from_secs(state.started_at.elapsed().as_secs());
    Json(StatusView {
        server_time: Utc::now(),
        uptime: humantime::format_duration(uptime).to_string(),
        version: env!("CARGO_PKG_VERSION"),
        database_type: "sqlite",
    })
}
