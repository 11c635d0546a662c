//! HTTP surface of the `DeskCode` admin server.

mod admin_codes;
mod admin_profiles;
mod client;
pub mod dto;
mod error;
mod system;

use std::time::Instant;

use axum::Router;
use axum::http::Method;
use axum::middleware;
use axum::routing::{delete, get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{JwtManager, require_admin};
use crate::engine::ConfigCodeEngine;
use crate::settings::SharedSettings;

pub use error::ApiError;

/// Shared application state threaded through axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: ConfigCodeEngine,
    pub jwt: JwtManager,
    pub settings: SharedSettings,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(engine: ConfigCodeEngine, jwt: JwtManager, settings: SharedSettings) -> Self {
        Self {
            engine,
            jwt,
            settings,
            started_at: Instant::now(),
        }
    }
}

/// Build the full router: public client routes plus JWT-guarded admin routes.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(system::health))
        .route("/api/config/{code}", get(client::redeem))
        .route("/api/config/{code}/validate", get(client::validate))
        .route("/admin/login", post(system::login));

    let admin = Router::new()
        .route("/admin/server-config/list", get(admin_profiles::list))
        .route("/admin/server-config/create", post(admin_profiles::create))
        .route("/admin/server-config/update/{id}", put(admin_profiles::update))
        .route("/admin/server-config/delete/{id}", delete(admin_profiles::delete))
        .route("/admin/server-config/detail/{id}", get(admin_profiles::detail))
        .route("/admin/server-config/set-default", post(admin_profiles::set_default))
        .route("/admin/server-config/default", get(admin_profiles::get_default))
        .route(
            "/admin/server-config/offline-code/{id}",
            post(admin_profiles::offline_code),
        )
        .route("/admin/config-code/generate", post(admin_codes::generate))
        .route(
            "/admin/config-code/batch-generate",
            post(admin_codes::batch_generate),
        )
        .route("/admin/config-code/list", get(admin_codes::list))
        .route("/admin/config-code/delete/{id}", delete(admin_codes::delete))
        .route("/admin/config-code/status/{id}", post(admin_codes::set_status))
        .route("/admin/config-code/usage/{id}", get(admin_codes::usage))
        .route("/admin/config-code/stats", get(admin_codes::stats))
        .route(
            "/admin/system/config",
            get(system::get_config).put(system::update_config),
        )
        .route("/admin/system/status", get(system::status))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .merge(public)
        .merge(admin)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
