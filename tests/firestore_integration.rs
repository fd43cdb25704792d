// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running.
//! Run with FIRESTORE_EMULATOR_HOST pointing at
//! `gcloud emulators firestore start`.
//!
//! The emulator provides a clean state for each test run.

use roster_cards::db::{StudentStore, StudentWrite};
use roster_cards::error::AppError;
use roster_cards::models::TableColor;
use roster_cards::services::students::{self, KeyLocks};
use roster_cards::services::{import_csv, sync, ImportOptions, RosterCache};
use serde_json::json;

mod common;
use common::{student, test_db, test_db_offline};

/// Generate a unique student number for test isolation.
fn unique_student_number() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("T{}", nanos)
}

#[tokio::test]
async fn test_offline_store_errors() {
    let db = test_db_offline();
    let write = StudentWrite::upsert(student("1", "Alex", "P3"), None);

    assert!(matches!(
        db.put_student(&write).await,
        Err(AppError::Database(_))
    ));
    assert!(matches!(
        db.get_student("1").await,
        Err(AppError::Database(_))
    ));
}

#[tokio::test]
async fn test_new_student_creation() {
    require_emulator!();

    let db = test_db().await;
    let number = unique_student_number();

    let before = db.get_student(&number).await.unwrap();
    assert!(before.is_none(), "Student should not exist before creation");

    let fields = json!({
        "studentNumber": number,
        "name": "Alex Santos",
        "section": "P3-Ruby",
        "pw": "SamplePW",
        "tableColor": "yellow",
        "chromebookNumber": 14,
    });
    students::upsert_student(&db, &KeyLocks::default(), fields.as_object().unwrap())
        .await
        .unwrap();

    let fetched = db.get_student(&number).await.unwrap().unwrap();
    assert_eq!(fetched.record.name, "Alex Santos");
    assert_eq!(fetched.record.secret, "SamplePW");
    assert_eq!(fetched.record.table_color, TableColor::Yellow);
    assert_eq!(fetched.record.device_number, "14");
    assert!(fetched.created_at.is_some());
    assert!(fetched.updated_at.is_some());
}

#[tokio::test]
async fn test_upsert_preserves_created_at() {
    require_emulator!();

    let db = test_db().await;
    let locks = KeyLocks::default();
    let number = unique_student_number();

    students::save_record(&db, &locks, student(&number, "Alex", "P3"), false)
        .await
        .unwrap();
    let first = db.get_student(&number).await.unwrap().unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    students::save_record(&db, &locks, student(&number, "Alexis", "P4"), false)
        .await
        .unwrap();
    let second = db.get_student(&number).await.unwrap().unwrap();

    assert_eq!(second.record.name, "Alexis");
    assert_eq!(first.created_at, second.created_at);
    assert_ne!(first.updated_at, second.updated_at);
}

#[tokio::test]
async fn test_key_with_slash_round_trips() {
    require_emulator!();

    let db = test_db().await;
    let number = format!("{}/B", unique_student_number());

    students::save_record(&db, &KeyLocks::default(), student(&number, "Slash", "P3"), false)
        .await
        .unwrap();

    let fetched = db.get_student(&number).await.unwrap().unwrap();
    assert_eq!(fetched.record.student_number, number);

    db.delete_student(&number).await.unwrap();
    assert!(db.get_student(&number).await.unwrap().is_none());
}

#[tokio::test]
async fn test_import_then_snapshot() {
    require_emulator!();

    let db = test_db().await;
    let a = unique_student_number();
    let b = unique_student_number();
    let text = format!(
        "studentNumber,name,section,tableColor\n{},Alex,P3,red\n{},Mia,P3,blue\n",
        a, b
    );

    let report = import_csv(&db, &text, &ImportOptions::default())
        .await
        .unwrap();
    assert_eq!(report.ok_count, 2);
    assert!(report.errors.is_empty());

    let cache = RosterCache::new();
    sync::sync_once(&db, &cache).await.unwrap();
    assert!(cache.find(&a).is_some());
    assert_eq!(cache.find(&b).unwrap().table_color, TableColor::Blue);

    // Snapshots come back ordered by student number.
    let records = cache.records();
    let keys: Vec<&str> = records.iter().map(|r| r.student_number.as_str()).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}
