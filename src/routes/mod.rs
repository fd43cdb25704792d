// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod gate;
pub mod import;
pub mod students;

use crate::db::StudentStore;
use crate::services::SyncStatus;
use crate::AppState;
use axum::http::{header, Method};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// Sync and lock state for the status pills.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StatusResponse {
    pub sync: SyncStatus,
    pub last_snapshot_at: Option<String>,
    pub student_count: usize,
    pub secret_unlocked: bool,
    pub teacher_password_set: bool,
}

pub(crate) fn status_of<S: StudentStore>(state: &AppState<S>) -> StatusResponse {
    StatusResponse {
        sync: state.roster.status(),
        last_snapshot_at: state.roster.received_at(),
        student_count: state.roster.len(),
        secret_unlocked: state.gate.is_unlocked(),
        teacher_password_set: state.gate.is_configured(),
    }
}

async fn get_status<S: StudentStore>(State(state): State<Arc<AppState<S>>>) -> Json<StatusResponse> {
    Json(status_of(&state))
}

/// Take a snapshot right away instead of waiting for the next tick.
async fn refresh<S: StudentStore>(
    State(state): State<Arc<AppState<S>>>,
) -> crate::error::Result<Json<StatusResponse>> {
    crate::services::sync::sync_once(&state.db, &state.roster).await?;
    Ok(Json(status_of(&state)))
}

/// Build the complete router with all routes.
pub fn create_router<S: StudentStore>(state: Arc<AppState<S>>) -> Router {
    // CORS layer - allow requests from frontend URL and localhost (for dev)
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/status", get(get_status::<S>))
        .route("/api/refresh", post(refresh::<S>))
        .merge(students::routes::<S>())
        .merge(import::routes::<S>())
        .merge(gate::routes::<S>())
        .layer(axum::middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
