// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local mirror of the students collection and search over it.
//!
//! The cache is only ever replaced wholesale from a store snapshot. Readers
//! grab an `Arc` of the current list, so a search never observes a
//! half-applied snapshot.

use crate::models::StudentRecord;
use crate::time_utils::format_utc_rfc3339;
use serde::Serialize;
use std::sync::{Arc, RwLock};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Health of the snapshot feed, kept until the next snapshot or error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum SyncStatus {
    /// No snapshot received yet.
    Connecting,
    Connected,
    /// Last snapshot attempt failed; records are from the last good one.
    Error(String),
}

#[derive(Debug)]
struct Snapshot {
    records: Arc<Vec<StudentRecord>>,
    status: SyncStatus,
    received_at: Option<String>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            records: Arc::new(Vec::new()),
            status: SyncStatus::Connecting,
            received_at: None,
        }
    }
}

/// Ordered, read-mostly copy of the roster.
#[derive(Debug, Default)]
pub struct RosterCache {
    inner: RwLock<Snapshot>,
}

impl RosterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new snapshot, discarding the previous one entirely.
    pub fn replace(&self, records: Vec<StudentRecord>) {
        let count = records.len();
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.records = Arc::new(records);
        inner.status = SyncStatus::Connected;
        inner.received_at = Some(format_utc_rfc3339(chrono::Utc::now()));
        drop(inner);
        tracing::debug!(count, "Roster snapshot applied");
    }

    /// Record a feed failure. The current records stay in place.
    pub fn mark_error(&self, message: impl Into<String>) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.status = SyncStatus::Error(message.into());
    }

    /// The current snapshot, in store order.
    pub fn records(&self) -> Arc<Vec<StudentRecord>> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .records
            .clone()
    }

    pub fn status(&self) -> SyncStatus {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .status
            .clone()
    }

    /// When the current snapshot was applied (RFC3339).
    pub fn received_at(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .received_at
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, student_number: &str) -> Option<StudentRecord> {
        self.records()
            .iter()
            .find(|r| r.student_number == student_number)
            .cloned()
    }

    /// Records matching `query`; see [`filter_records`].
    pub fn search(&self, query: &str) -> Vec<StudentRecord> {
        filter_records(&self.records(), query)
    }
}

/// Case-insensitive substring filter over every displayed field plus the
/// secret. A blank query returns everything in the original order.
pub fn filter_records(records: &[StudentRecord], query: &str) -> Vec<StudentRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records.to_vec();
    }

    records
        .iter()
        .filter(|r| r.search_haystack().contains(&needle))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(number: &str, name: &str, secret: &str) -> StudentRecord {
        StudentRecord::from_pairs([
            ("studentNumber", number),
            ("name", name),
            ("section", "P3-Ruby"),
            ("pw", secret),
        ])
    }

    #[test]
    fn test_empty_query_returns_everything_in_order() {
        let cache = RosterCache::new();
        cache.replace(vec![
            student("2", "Mia", ""),
            student("1", "Alex", ""),
        ]);

        let all = cache.search("   ");
        let numbers: Vec<&str> = all.iter().map(|r| r.student_number.as_str()).collect();
        assert_eq!(numbers, vec!["2", "1"]);
    }

    #[test]
    fn test_search_is_case_insensitive_and_covers_secret() {
        let cache = RosterCache::new();
        cache.replace(vec![
            student("1", "Alex Santos", "Tiger42"),
            student("2", "Mia Cruz", ""),
        ]);

        assert_eq!(cache.search("SANTOS").len(), 1);
        assert_eq!(cache.search("tiger")[0].student_number, "1");
        assert_eq!(cache.search("ruby").len(), 2);
        assert!(cache.search("nobody").is_empty());
    }

    #[test]
    fn test_replace_is_wholesale() {
        let cache = RosterCache::new();
        cache.replace(vec![student("1", "A", ""), student("2", "B", "")]);
        cache.replace(vec![student("3", "C", "")]);

        assert_eq!(cache.len(), 1);
        assert!(cache.find("1").is_none());
        assert!(cache.find("3").is_some());
    }

    #[test]
    fn test_error_keeps_last_good_snapshot() {
        let cache = RosterCache::new();
        assert_eq!(cache.status(), SyncStatus::Connecting);

        cache.replace(vec![student("1", "A", "")]);
        cache.mark_error("permission denied");

        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.status(),
            SyncStatus::Error("permission denied".to_string())
        );

        cache.replace(vec![]);
        assert_eq!(cache.status(), SyncStatus::Connected);
    }

    #[test]
    fn test_status_serialization() {
        let value = serde_json::to_value(SyncStatus::Error("boom".to_string())).unwrap();
        assert_eq!(value["state"], "error");
        assert_eq!(value["message"], "boom");
    }
}
