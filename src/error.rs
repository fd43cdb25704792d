// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::models::ValidationError;
use crate::services::gate::GateError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A record failed its required-field checks.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Import input that cannot be processed at all (no data, missing column).
    #[error("{0}")]
    MalformedInput(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// The request collides with work already in progress.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Gate(#[from] GateError),

    /// The document store rejected a read or write.
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                Some(err.to_string()),
            ),
            AppError::MalformedInput(msg) => {
                (StatusCode::BAD_REQUEST, "malformed_input", Some(msg.clone()))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),
            AppError::Gate(err) => {
                let status = match err {
                    GateError::WrongPassword => StatusCode::UNAUTHORIZED,
                    GateError::NotConfigured | GateError::AlreadyConfigured => {
                        StatusCode::CONFLICT
                    }
                    GateError::EmptyPassword | GateError::Mismatch => StatusCode::BAD_REQUEST,
                };
                (status, "gate_error", Some(err.to_string()))
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                // Single-record saves show the store's message directly.
                (StatusCode::BAD_GATEWAY, "database_error", Some(msg.clone()))
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
