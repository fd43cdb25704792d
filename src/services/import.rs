// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CSV bulk import.
//!
//! Each data row is normalized, validated and upserted on its own; a bad
//! row is reported and skipped, never aborting the batch. Only a file with
//! no data or a missing mandatory column fails the whole import, and that
//! happens before any write.
//!
//! Writes are not transactional: rows written before a failure or a
//! cancellation stay written.

use crate::csv_codec::{self, HeaderIndex};
use crate::db::StudentStore;
use crate::error::{AppError, Result};
use crate::models::student::fields;
use crate::models::{validate, StudentRecord};
use crate::services::students::{save_record, KeyLocks};
use futures_util::{stream, StreamExt};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Columns an import file must name in its header.
pub const REQUIRED_COLUMNS: [&str; 4] = [
    fields::STUDENT_NUMBER,
    fields::NAME,
    fields::SECTION,
    fields::TABLE_COLOR,
];

/// Upper bound on concurrent row writes.
pub const MAX_IMPORT_CONCURRENCY: usize = 16;

/// Shared flag for stopping an import between rows.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The one import allowed to run at a time, and its cancel handle.
#[derive(Debug, Default)]
pub struct ImportRegistry {
    slot: Mutex<Option<CancelFlag>>,
}

impl ImportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<CancelFlag>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Claim the slot for a new import, or `None` if one is already running.
    /// The slot is released when the guard drops.
    pub fn begin(&self) -> Option<ImportGuard<'_>> {
        let mut slot = self.slot();
        if slot.is_some() {
            return None;
        }
        let flag = CancelFlag::new();
        *slot = Some(flag.clone());
        Some(ImportGuard {
            registry: self,
            flag,
        })
    }

    /// Cancel the running import. False when none is running.
    pub fn cancel(&self) -> bool {
        match self.slot().as_ref() {
            Some(flag) => {
                flag.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.slot().is_some()
    }
}

/// Holds the import slot for one run.
#[derive(Debug)]
pub struct ImportGuard<'a> {
    registry: &'a ImportRegistry,
    flag: CancelFlag,
}

impl ImportGuard<'_> {
    pub fn flag(&self) -> &CancelFlag {
        &self.flag
    }
}

impl Drop for ImportGuard<'_> {
    fn drop(&mut self) {
        *self.registry.slot() = None;
    }
}

/// Knobs for a single import run.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Rows in flight at once. 1 writes strictly in file order.
    pub concurrency: usize,
    pub cancel: CancelFlag,
    pub locks: KeyLocks,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            cancel: CancelFlag::default(),
            locks: KeyLocks::default(),
        }
    }
}

/// Outcome of an import: successful writes plus per-row messages in file
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ImportReport {
    pub ok_count: usize,
    pub errors: Vec<String>,
    /// Set when the run was cancelled before every row was attempted.
    pub cancelled: bool,
}

impl ImportReport {
    /// Short text for the teacher: counts, then the first `limit` messages.
    pub fn summary(&self, limit: usize) -> String {
        let mut out = format!(
            "Imported: {}. Errors: {}",
            self.ok_count,
            self.errors.len()
        );
        if self.cancelled {
            out.push_str(" (cancelled)");
        }
        if !self.errors.is_empty() {
            out.push_str("\n\n");
            out.push_str(
                &self
                    .errors
                    .iter()
                    .take(limit)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
            if self.errors.len() > limit {
                out.push_str("\n…more");
            }
        }
        out
    }
}

enum RowOutcome {
    Written,
    Failed(String),
    Skipped,
}

/// Import every data row of `text` into `store`.
pub async fn import_csv<S: StudentStore>(
    store: &S,
    text: &str,
    options: &ImportOptions,
) -> Result<ImportReport> {
    let rows = csv_codec::parse(text);
    if rows.len() < 2 {
        return Err(AppError::MalformedInput("CSV has no data rows.".to_string()));
    }

    let header = HeaderIndex::new(&rows[0]);
    if let Some(column) = header.first_missing(&REQUIRED_COLUMNS) {
        return Err(AppError::MalformedInput(format!(
            "Missing column: {}",
            column
        )));
    }

    let concurrency = options.concurrency.clamp(1, MAX_IMPORT_CONCURRENCY);
    tracing::info!(
        rows = rows.len() - 1,
        concurrency,
        "Starting CSV import"
    );

    // Files without a pw column leave stored secrets untouched.
    let keep_secret = !header.contains(fields::SECRET);

    // `buffered` yields results in row order whatever order writes finish.
    let header = &header;
    let outcomes: Vec<RowOutcome> = stream::iter(rows.into_iter().enumerate().skip(1))
        .map(|(index, row)| async move {
            // Data row r is reported as r + 1 to account for the header.
            import_row(store, header, index + 1, &row, options, keep_secret).await
        })
        .buffered(concurrency)
        .collect()
        .await;

    let mut report = ImportReport::default();
    for outcome in outcomes {
        match outcome {
            RowOutcome::Written => report.ok_count += 1,
            RowOutcome::Failed(message) => report.errors.push(message),
            RowOutcome::Skipped => report.cancelled = true,
        }
    }

    tracing::info!(
        ok_count = report.ok_count,
        error_count = report.errors.len(),
        cancelled = report.cancelled,
        "CSV import finished"
    );
    Ok(report)
}

async fn import_row<S: StudentStore>(
    store: &S,
    header: &HeaderIndex,
    row_number: usize,
    row: &[String],
    options: &ImportOptions,
    keep_secret: bool,
) -> RowOutcome {
    if options.cancel.is_cancelled() {
        return RowOutcome::Skipped;
    }

    let record = StudentRecord::from_pairs(header.extract(row));
    if let Some(err) = validate(&record) {
        return RowOutcome::Failed(format!("Row {}: {}", row_number, err));
    }

    match save_record(store, &options.locks, record, keep_secret).await {
        Ok(_) => RowOutcome::Written,
        Err(e) => {
            tracing::warn!(row = row_number, error = %e, "Import row write failed");
            RowOutcome::Failed(format!("Row {}: Store write failed", row_number))
        }
    }
}
