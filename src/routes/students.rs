// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Roster routes: search, single-record edits, and card HTML.

use crate::db::StudentStore;
use crate::error::{AppError, Result};
use crate::models::student::fields;
use crate::models::StudentRecord;
use crate::services::{students, sync};
use crate::time_utils::format_utc_rfc3339;
use crate::views::{self, RosterView};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::Html,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Roster routes.
pub fn routes<S: StudentStore>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route("/api/students", get(list_students::<S>).post(create_student::<S>))
        .route(
            "/api/students/{student_number}",
            get(get_student::<S>)
                .put(update_student::<S>)
                .delete(delete_student::<S>),
        )
        .route("/api/students/{student_number}/card", get(get_card::<S>))
        .route("/api/students/{student_number}/print", get(get_print::<S>))
}

// ─── Search ──────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct SearchQuery {
    #[validate(length(max = 200))]
    q: Option<String>,
}

/// Roster table for the current search.
async fn list_students<S: StudentStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<RosterView>> {
    params
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let query = params.q.unwrap_or_default();
    let matches = state.roster.search(&query);
    tracing::debug!(query = %query, matches = matches.len(), "Roster search");

    Ok(Json(views::render_roster(&matches, state.gate.is_unlocked())))
}

// ─── Single Record ───────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StudentResponse {
    /// Form fields. `pw` is left out while locked, and saving a form
    /// without it keeps the stored secret.
    #[cfg_attr(feature = "binding-generation", ts(type = "Record<string, string>"))]
    pub student: Map<String, Value>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub secret_masked: bool,
}

/// Load one student into the edit form (read from the store, not the cache).
async fn get_student<S: StudentStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(student_number): Path<String>,
) -> Result<Json<StudentResponse>> {
    let stored = students::get_student(&state.db, &student_number).await?;
    let unlocked = state.gate.is_unlocked();

    let mut student = stored.record.to_fields();
    if !unlocked {
        student.remove(fields::SECRET);
    }

    Ok(Json(StudentResponse {
        student,
        created_at: stored.created_at.map(format_utc_rfc3339),
        updated_at: stored.updated_at.map(format_utc_rfc3339),
        secret_masked: !unlocked,
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SaveResponse {
    pub student: StudentRecord,
}

/// Re-read the collection after our own write so the table catches up
/// without waiting for the next tick.
async fn refresh_after_write<S: StudentStore>(state: &AppState<S>) {
    if let Err(e) = sync::sync_once(&state.db, &state.roster).await {
        tracing::debug!(error = %e, "Post-write snapshot failed");
    }
}

/// Create or update a student from form fields.
async fn create_student<S: StudentStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(fields): Json<Map<String, Value>>,
) -> Result<Json<SaveResponse>> {
    let saved = students::upsert_student(&state.db, &state.key_locks, &fields).await?;
    refresh_after_write(&state).await;

    Ok(Json(SaveResponse {
        student: views::display_record(&saved, state.gate.is_unlocked()),
    }))
}

/// Update an existing student; the number in the path is authoritative.
async fn update_student<S: StudentStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(student_number): Path<String>,
    Json(fields): Json<Map<String, Value>>,
) -> Result<Json<SaveResponse>> {
    let saved =
        students::update_student(&state.db, &state.key_locks, &student_number, &fields).await?;
    refresh_after_write(&state).await;

    Ok(Json(SaveResponse {
        student: views::display_record(&saved, state.gate.is_unlocked()),
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteResponse {
    pub deleted: String,
}

async fn delete_student<S: StudentStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(student_number): Path<String>,
) -> Result<Json<DeleteResponse>> {
    students::delete_student(&state.db, &state.key_locks, &student_number).await?;
    refresh_after_write(&state).await;

    Ok(Json(DeleteResponse {
        deleted: student_number,
    }))
}

// ─── Cards ───────────────────────────────────────────────────

fn cached_student<S: StudentStore>(
    state: &AppState<S>,
    student_number: &str,
) -> Result<StudentRecord> {
    state
        .roster
        .find(student_number)
        .ok_or_else(|| AppError::NotFound(format!("Student {}", student_number)))
}

async fn get_card<S: StudentStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(student_number): Path<String>,
) -> Result<Html<String>> {
    let record = cached_student(&state, &student_number)?;
    Ok(Html(views::render_card_html(
        &record,
        state.gate.is_unlocked(),
    )))
}

async fn get_print<S: StudentStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(student_number): Path<String>,
) -> Result<Html<String>> {
    let record = cached_student(&state, &student_number)?;
    Ok(Html(views::render_print_html(
        &record,
        state.gate.is_unlocked(),
    )))
}
