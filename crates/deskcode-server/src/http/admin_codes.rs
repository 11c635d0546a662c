//! `/admin/config-code/*` handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use deskcode_core::db::unix_timestamp;
use serde_json::{Value, json};
use tracing::{info, instrument};

use super::dto::{
    BatchGenerateBody, BatchView, CodeListQuery, CodeListingView, CodeStatusBody, CodeView,
    GenerateBody, UsageView,
};
use super::{ApiError, AppState};
use crate::auth::AdminIdentity;
use crate::engine::{GenerateRequest, PageRequest, Paged};
use crate::storage::CodeStats;

fn request_for(
    admin: &AdminIdentity,
    profile_id: i64,
    expires_at: Option<DateTime<Utc>>,
    max_usage: Option<i64>,
) -> GenerateRequest {
    GenerateRequest {
        profile_id,
        expires_at: expires_at.map(|t| t.timestamp()),
        max_usage,
        created_by: admin.id,
    }
}

#[instrument(skip_all, fields(admin = %admin.username, profile_id = body.profile_id))]
pub async fn generate(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminIdentity>,
    Json(body): Json<GenerateBody>,
) -> Result<(StatusCode, Json<CodeView>), ApiError> {
    let request = request_for(&admin, body.profile_id, body.expires_at, body.max_usage);
    let code = state.engine.generate(&request).await?;
    info!(code_id = code.id, "audit: config_code.generate");
    Ok((StatusCode::CREATED, Json(CodeView::new(code, unix_timestamp()))))
}

#[instrument(skip_all, fields(admin = %admin.username, profile_id = body.profile_id))]
pub async fn batch_generate(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminIdentity>,
    Json(body): Json<BatchGenerateBody>,
) -> Result<(StatusCode, Json<BatchView>), ApiError> {
    let request = request_for(&admin, body.profile_id, body.expires_at, body.max_usage);
    let codes = state.engine.batch_generate(&request, body.count).await?;
    info!(count = codes.len(), "audit: config_code.batch_generate");

    let now = unix_timestamp();
    let codes: Vec<CodeView> = codes.into_iter().map(|c| CodeView::new(c, now)).collect();
    Ok((
        StatusCode::CREATED,
        Json(BatchView {
            count: codes.len(),
            codes,
        }),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<CodeListQuery>,
) -> Result<Json<Paged<CodeListingView>>, ApiError> {
    let (filter, page) = query.split();
    let codes = state.engine.list_codes(&filter, page).await?;
    let now = unix_timestamp();
    Ok(Json(codes.map(|row| CodeListingView::new(row, now))))
}

#[instrument(skip(state, admin), fields(admin = %admin.username))]
pub async fn delete(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminIdentity>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state.engine.delete_code(id).await?;
    info!("audit: config_code.delete");
    Ok(Json(json!({ "deleted": id })))
}

#[instrument(skip(state, body))]
pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<CodeStatusBody>,
) -> Result<Json<CodeView>, ApiError> {
    let code = state.engine.set_code_status(id, body.enabled).await?;
    Ok(Json(CodeView::new(code, unix_timestamp())))
}

pub async fn usage(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Paged<UsageView>>, ApiError> {
    let records = state.engine.list_usage(id, page).await?;
    Ok(Json(records.map(UsageView::from)))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<CodeStats>, ApiError> {
    Ok(Json(state.engine.stats().await?))
}
