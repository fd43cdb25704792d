// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Teacher password gate routes.

use crate::db::StudentStore;
use crate::error::{AppError, Result};
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Gate routes.
pub fn routes<S: StudentStore>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route("/api/gate/password", post(set_password::<S>))
        .route("/api/gate/unlock", post(unlock::<S>))
        .route("/api/gate/lock", post(lock::<S>))
}

#[derive(Deserialize, Validate)]
struct SetPasswordRequest {
    #[validate(length(max = 256))]
    password: String,
    #[validate(length(max = 256))]
    confirm: String,
}

#[derive(Deserialize, Validate)]
struct UnlockRequest {
    #[validate(length(max = 256))]
    password: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GateResponse {
    pub unlocked: bool,
}

async fn set_password<S: StudentStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<SetPasswordRequest>,
) -> Result<Json<GateResponse>> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    state.gate.set_password(&req.password, &req.confirm)?;

    Ok(Json(GateResponse {
        unlocked: state.gate.is_unlocked(),
    }))
}

async fn unlock<S: StudentStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<UnlockRequest>,
) -> Result<Json<GateResponse>> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    state.gate.unlock(&req.password)?;

    Ok(Json(GateResponse {
        unlocked: state.gate.is_unlocked(),
    }))
}

async fn lock<S: StudentStore>(State(state): State<Arc<AppState<S>>>) -> Json<GateResponse> {
    state.gate.lock();
    Json(GateResponse { unlocked: false })
}
