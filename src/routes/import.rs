// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CSV import and template download routes.

use crate::csv_codec;
use crate::db::StudentStore;
use crate::error::{AppError, Result};
use crate::services::import::{import_csv, ImportOptions};
use crate::services::sync;
use crate::AppState;
use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Import routes.
pub fn routes<S: StudentStore>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route("/api/import", post(import_students::<S>))
        .route("/api/import/cancel", post(cancel_import::<S>))
        .route("/api/import/template", get(download_template))
}

/// Downloadable CSV template.
async fn download_template() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, csv_codec::CSV_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", csv_codec::TEMPLATE_FILE_NAME),
            ),
        ],
        csv_codec::template(),
    )
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ImportResponse {
    pub ok_count: usize,
    pub errors: Vec<String>,
    pub cancelled: bool,
    /// Counts plus the first few row errors, ready to show.
    pub summary: String,
}

/// Import the CSV text in the request body.
async fn import_students<S: StudentStore>(
    State(state): State<Arc<AppState<S>>>,
    body: String,
) -> Result<Json<ImportResponse>> {
    let Some(guard) = state.active_import.begin() else {
        return Err(AppError::Conflict(
            "An import is already running.".to_string(),
        ));
    };

    let options = ImportOptions {
        concurrency: state.config.import_concurrency,
        cancel: guard.flag().clone(),
        locks: state.key_locks.clone(),
    };
    let result = import_csv(&state.db, &body, &options).await;
    drop(guard);

    let report = result?;
    if report.ok_count > 0 {
        if let Err(e) = sync::sync_once(&state.db, &state.roster).await {
            tracing::debug!(error = %e, "Post-import snapshot failed");
        }
    }

    Ok(Json(ImportResponse {
        summary: report.summary(state.config.import_error_preview),
        ok_count: report.ok_count,
        errors: report.errors,
        cancelled: report.cancelled,
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CancelResponse {
    /// False when no import was running.
    pub cancelled: bool,
}

/// Ask the running import to stop before its next row.
async fn cancel_import<S: StudentStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<CancelResponse> {
    let cancelled = state.active_import.cancel();
    if cancelled {
        tracing::info!("Import cancellation requested");
    }

    Json(CancelResponse { cancelled })
}
