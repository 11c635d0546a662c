//! `/admin/server-config/*` handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde_json::{Value, json};
use tracing::instrument;

use super::dto::{OfflineCodeView, ProfileListQuery, ProfileView, SetDefaultBody};
use super::{ApiError, AppState};
use crate::engine::{Paged, ProfileForm};

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ProfileListQuery>,
) -> Result<Json<Paged<ProfileView>>, ApiError> {
    let (filter, page) = query.split();
    let profiles = state.engine.list_profiles(&filter, page).await?;
    Ok(Json(profiles.map(ProfileView::from)))
}

#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    Json(form): Json<ProfileForm>,
) -> Result<(StatusCode, Json<ProfileView>), ApiError> {
    let profile = state.engine.create_profile(&form).await?;
    Ok((StatusCode::CREATED, Json(profile.into())))
}

#[instrument(skip(state, form))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<ProfileForm>,
) -> Result<Json<ProfileView>, ApiError> {
    let profile = state.engine.update_profile(id, &form).await?;
    Ok(Json(profile.into()))
}

#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state.engine.delete_profile(id).await?;
    Ok(Json(json!({ "deleted": id })))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProfileView>, ApiError> {
    let profile = state.engine.profile_detail(id).await?;
    Ok(Json(profile.into()))
}

#[instrument(skip_all, fields(profile_id = body.id))]
pub async fn set_default(
    State(state): State<AppState>,
    Json(body): Json<SetDefaultBody>,
) -> Result<Json<ProfileView>, ApiError> {
    state.engine.set_default(body.id).await?;
    let profile = state.engine.profile_detail(body.id).await?;
    Ok(Json(profile.into()))
}

pub async fn get_default(State(state): State<AppState>) -> Result<Json<ProfileView>, ApiError> {
    let profile = state.engine.get_default().await?;
    Ok(Json(profile.into()))
}

#[instrument(skip(state))]
pub async fn offline_code(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<OfflineCodeView>, ApiError> {
    let code = state.engine.issue_offline_code(id).await?;
    Ok(Json(OfflineCodeView {
        profile_id: id,
        code,
    }))
}
