// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Single-record create/update/delete against the student store.

use crate::db::{StudentStore, StudentWrite};
use crate::error::{AppError, Result};
use crate::models::student::fields;
use crate::models::{normalize, validate, StoredStudent, StudentRecord};
use crate::views;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-student-number write locks.
///
/// An upsert reads the existing document before writing it back, so two
/// writers on the same key must not interleave or one `createdAt` is lost.
pub type KeyLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Wait for exclusive write access to `student_number`.
pub async fn lock_key(locks: &KeyLocks, student_number: &str) -> OwnedMutexGuard<()> {
    let lock = locks
        .entry(student_number.to_string())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone();
    lock.lock_owned().await
}

/// Whether form fields carry a new secret. A missing or null `pw`, or the
/// bullets a locked form shows, means "leave the stored one alone".
pub fn carries_secret(raw: &Map<String, Value>) -> bool {
    match raw.get(fields::SECRET) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !views::is_mask(s),
        Some(_) => true,
    }
}

/// Upsert an already-validated record, preserving any stored `createdAt`.
///
/// With `keep_secret`, the stored `pw` replaces whatever `record` holds.
pub async fn save_record<S: StudentStore>(
    store: &S,
    locks: &KeyLocks,
    mut record: StudentRecord,
    keep_secret: bool,
) -> Result<StudentRecord> {
    let _guard = lock_key(locks, &record.student_number).await;

    let existing = store.get_student(&record.student_number).await?;
    if keep_secret {
        record.secret = existing
            .as_ref()
            .map(|doc| doc.record.secret.clone())
            .unwrap_or_default();
    }
    let write = StudentWrite::upsert(record, existing.as_ref());
    store.put_student(&write).await?;

    tracing::info!(
        student_number = %write.record.student_number,
        created = existing.is_none(),
        "Student saved"
    );
    Ok(write.record)
}

/// Normalize, validate and upsert a record from loosely-typed form fields.
pub async fn upsert_student<S: StudentStore>(
    store: &S,
    locks: &KeyLocks,
    raw: &Map<String, Value>,
) -> Result<StudentRecord> {
    let record = normalize(raw);
    if let Some(err) = validate(&record) {
        return Err(err.into());
    }
    save_record(store, locks, record, !carries_secret(raw)).await
}

/// Update the record stored under `student_number`.
///
/// The key itself is immutable; changing it means delete and re-create.
pub async fn update_student<S: StudentStore>(
    store: &S,
    locks: &KeyLocks,
    student_number: &str,
    raw: &Map<String, Value>,
) -> Result<StudentRecord> {
    let mut record = normalize(raw);
    if record.student_number.is_empty() {
        record.student_number = student_number.trim().to_string();
    }
    if record.student_number != student_number.trim() {
        return Err(AppError::BadRequest(
            "studentNumber cannot be changed; delete and re-create the student".to_string(),
        ));
    }
    if let Some(err) = validate(&record) {
        return Err(err.into());
    }
    save_record(store, locks, record, !carries_secret(raw)).await
}

/// Fetch one student for editing.
pub async fn get_student<S: StudentStore>(store: &S, student_number: &str) -> Result<StoredStudent> {
    store
        .get_student(student_number)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Student {}", student_number)))
}

/// Delete a student. The secret lives on the same document, so it goes too.
pub async fn delete_student<S: StudentStore>(
    store: &S,
    locks: &KeyLocks,
    student_number: &str,
) -> Result<()> {
    let _guard = lock_key(locks, student_number).await;
    store.delete_student(student_number).await?;
    tracing::info!(student_number, "Student deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::ValidationError;
    use serde_json::json;

    fn raw(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_upsert_preserves_created_at() {
        let store = MemoryStore::new();
        let locks = KeyLocks::default();
        let fields = raw(json!({"studentNumber": "1", "name": "Alex", "section": "P3"}));

        upsert_student(&store, &locks, &fields).await.unwrap();
        let first = store.get_student("1").await.unwrap().unwrap();

        let renamed = raw(json!({"studentNumber": "1", "name": "Alexis", "section": "P3"}));
        upsert_student(&store, &locks, &renamed).await.unwrap();
        let second = store.get_student("1").await.unwrap().unwrap();

        assert_eq!(second.record.name, "Alexis");
        assert!(first.created_at.is_some());
        assert_eq!(first.created_at, second.created_at);
        assert!(second.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_invalid_record_is_not_written() {
        let store = MemoryStore::new();
        let locks = KeyLocks::default();
        let err = upsert_student(&store, &locks, &raw(json!({"studentNumber": "1"})))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Validation(ValidationError::MissingName)
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_update_rejects_rekey() {
        let store = MemoryStore::new();
        let locks = KeyLocks::default();
        let fields = raw(json!({"studentNumber": "2", "name": "Alex", "section": "P3"}));

        let err = update_student(&store, &locks, "1", &fields).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let keyless = raw(json!({"name": "Alex", "section": "P3"}));
        let saved = update_student(&store, &locks, "1", &keyless).await.unwrap();
        assert_eq!(saved.student_number, "1");
    }

    #[tokio::test]
    async fn test_store_error_surfaces() {
        let store = MemoryStore::new();
        store.fail_writes_for("1");
        let locks = KeyLocks::default();
        let fields = raw(json!({"studentNumber": "1", "name": "Alex", "section": "P3"}));

        let err = upsert_student(&store, &locks, &fields).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_masked_or_missing_secret_keeps_stored_one() {
        let store = MemoryStore::new();
        let locks = KeyLocks::default();
        let fields = raw(json!({"studentNumber": "1", "name": "Alex", "section": "P3", "pw": "Tiger42"}));
        upsert_student(&store, &locks, &fields).await.unwrap();

        for pw in [json!("••••••"), Value::Null] {
            let echoed = raw(json!({"studentNumber": "1", "name": "Alex B", "section": "P3", "pw": pw}));
            update_student(&store, &locks, "1", &echoed).await.unwrap();
            let doc = store.get_student("1").await.unwrap().unwrap();
            assert_eq!(doc.record.secret, "Tiger42");
            assert_eq!(doc.record.name, "Alex B");
        }

        let without = raw(json!({"studentNumber": "1", "name": "Alex", "section": "P3"}));
        upsert_student(&store, &locks, &without).await.unwrap();
        assert_eq!(store.get_student("1").await.unwrap().unwrap().record.secret, "Tiger42");

        let changed = raw(json!({"studentNumber": "1", "name": "Alex", "section": "P3", "pw": "Lion7"}));
        update_student(&store, &locks, "1", &changed).await.unwrap();
        assert_eq!(store.get_student("1").await.unwrap().unwrap().record.secret, "Lion7");

        let cleared = raw(json!({"studentNumber": "1", "name": "Alex", "section": "P3", "pw": ""}));
        update_student(&store, &locks, "1", &cleared).await.unwrap();
        assert_eq!(store.get_student("1").await.unwrap().unwrap().record.secret, "");
    }

    #[test]
    fn test_carries_secret() {
        assert!(carries_secret(&raw(json!({"pw": "abc"}))));
        assert!(carries_secret(&raw(json!({"pw": ""}))));
        assert!(!carries_secret(&raw(json!({"pw": "••••"}))));
        assert!(!carries_secret(&raw(json!({"pw": null}))));
        assert!(!carries_secret(&raw(json!({"name": "x"}))));
    }

    #[tokio::test]
    async fn test_delete_and_missing() {
        let store = MemoryStore::new();
        let locks = KeyLocks::default();
        let fields = raw(json!({"studentNumber": "1", "name": "Alex", "section": "P3"}));
        upsert_student(&store, &locks, &fields).await.unwrap();

        delete_student(&store, &locks, "1").await.unwrap();
        let err = get_student(&store, "1").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
