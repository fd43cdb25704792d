// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use roster_cards::config::Config;
use roster_cards::db::{FirestoreDb, MemoryStore};
use roster_cards::models::StudentRecord;
use roster_cards::routes::create_router;
use roster_cards::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app backed by an in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState<MemoryStore>>) {
    create_test_app_with(Config::default())
}

#[allow(dead_code)]
pub fn create_test_app_with(config: Config) -> (axum::Router, Arc<AppState<MemoryStore>>) {
    let state = Arc::new(AppState::new(config, MemoryStore::new()));
    (create_router(state.clone()), state)
}

/// Minimal valid record.
#[allow(dead_code)]
pub fn student(number: &str, name: &str, section: &str) -> StudentRecord {
    StudentRecord::from_pairs([
        ("studentNumber", number),
        ("name", name),
        ("section", section),
    ])
}
