// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process student store.
//!
//! Behaves like the Firestore adapter (ordered listing, merge writes,
//! store-stamped timestamps) and can be told to fail writes for chosen
//! keys, which the import tests use to simulate store outages.

use crate::db::{StudentStore, StudentWrite, TimestampWrite};
use crate::error::AppError;
use crate::models::StoredStudent;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    docs: BTreeMap<String, StoredStudent>,
    failing_keys: HashSet<String>,
    fail_reads: bool,
}

/// Shared in-memory document collection. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make every write to `student_number` fail.
    pub fn fail_writes_for(&self, student_number: &str) {
        self.lock().failing_keys.insert(student_number.to_string());
    }

    /// Make listing and single reads fail (or succeed again).
    pub fn set_fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Insert a document as-is, bypassing timestamp stamping.
    pub fn seed(&self, doc: StoredStudent) {
        self.lock()
            .docs
            .insert(doc.record.student_number.clone(), doc);
    }

    pub fn len(&self) -> usize {
        self.lock().docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

impl StudentStore for MemoryStore {
    async fn list_students(&self) -> Result<Vec<StoredStudent>, AppError> {
        let inner = self.lock();
        if inner.fail_reads {
            return Err(AppError::Database("listing unavailable".to_string()));
        }
        Ok(inner.docs.values().cloned().collect())
    }

    async fn get_student(&self, student_number: &str) -> Result<Option<StoredStudent>, AppError> {
        let inner = self.lock();
        if inner.fail_reads {
            return Err(AppError::Database("read unavailable".to_string()));
        }
        Ok(inner.docs.get(student_number).cloned())
    }

    async fn put_student(&self, write: &StudentWrite) -> Result<(), AppError> {
        let key = write.record.student_number.clone();
        let mut inner = self.lock();
        if inner.failing_keys.contains(&key) {
            return Err(AppError::Database(format!("write rejected for {}", key)));
        }

        let stamp = now();
        let previous_created = inner.docs.get(&key).and_then(|d| d.created_at);
        let created_at = match &write.created_at {
            Some(TimestampWrite::ServerNow) => Some(stamp),
            Some(TimestampWrite::Keep(value)) => Some(*value),
            None => previous_created,
        };

        inner.docs.insert(
            key,
            StoredStudent {
                record: write.record.clone(),
                created_at,
                updated_at: Some(stamp),
            },
        );
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_student(&self, student_number: &str) -> Result<(), AppError> {
        self.lock().docs.remove(student_number);
        Ok(())
    }
}
