// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

const DEFAULT_SNAPSHOT_INTERVAL_SECS: u64 = 5;
const DEFAULT_IMPORT_ERROR_PREVIEW: usize = 20;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Hex SHA-256 of the teacher password, if pre-provisioned
    pub teacher_password_sha256: Option<String>,
    /// Seconds between roster snapshots
    pub snapshot_interval_secs: u64,
    /// Rows written concurrently during CSV import (1 = sequential)
    pub import_concurrency: usize,
    /// Per-row import errors included in the summary text
    pub import_error_preview: usize,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            teacher_password_sha256: None,
            snapshot_interval_secs: DEFAULT_SNAPSHOT_INTERVAL_SECS,
            import_concurrency: 1,
            import_error_preview: DEFAULT_IMPORT_ERROR_PREVIEW,
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let teacher_password_sha256 = match env::var("TEACHER_PASSWORD_SHA256") {
            Ok(v) if !v.trim().is_empty() => {
                let digest = v.trim().to_lowercase();
                if digest.len() != 64 || hex::decode(&digest).is_err() {
                    return Err(ConfigError::Invalid(
                        "TEACHER_PASSWORD_SHA256",
                        "expected 64 hex characters".to_string(),
                    ));
                }
                Some(digest)
            }
            _ => None,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: parse_var("PORT", 8080)?,
            teacher_password_sha256,
            snapshot_interval_secs: parse_var::<u64>(
                "SNAPSHOT_INTERVAL_SECS",
                DEFAULT_SNAPSHOT_INTERVAL_SECS,
            )?
            .max(1),
            import_concurrency: parse_var::<usize>("IMPORT_CONCURRENCY", 1)?.clamp(
                1,
                crate::services::import::MAX_IMPORT_CONCURRENCY,
            ),
            import_error_preview: parse_var("IMPORT_ERROR_PREVIEW", DEFAULT_IMPORT_ERROR_PREVIEW)?,
        })
    }

    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_secs(self.snapshot_interval_secs)
    }
}

/// Read and parse an optional variable, falling back to `default` when unset.
fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    Invalid(&'static str, String),
}
