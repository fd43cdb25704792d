// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Snapshot feed from the store into the roster cache.
//!
//! Each tick lists the whole collection and replaces the cache with it.
//! A failed tick leaves the last good snapshot in place and flips the
//! cache status to `Error` until the next successful one.

use crate::db::StudentStore;
use crate::error::Result;
use crate::services::roster::RosterCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Take one snapshot and apply it. Returns the number of records.
pub async fn sync_once<S: StudentStore>(store: &S, cache: &RosterCache) -> Result<usize> {
    match store.list_students().await {
        Ok(docs) => {
            let records: Vec<_> = docs.into_iter().map(|d| d.record).collect();
            let count = records.len();
            cache.replace(records);
            Ok(count)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Roster snapshot failed");
            cache.mark_error(e.to_string());
            Err(e)
        }
    }
}

/// Keep `cache` in step with `store` until `shutdown` flips to `true`.
///
/// Snapshots are taken one at a time, so they are applied in the order
/// they were read.
pub async fn run<S: StudentStore>(
    store: S,
    cache: Arc<RosterCache>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tracing::info!(interval_secs = interval.as_secs(), "Roster sync started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Errors are already recorded on the cache.
                let _ = sync_once(&store, &cache).await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    tracing::info!("Roster sync stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, StudentWrite, TimestampWrite};
    use crate::models::StudentRecord;
    use crate::services::roster::SyncStatus;

    async fn seed(store: &MemoryStore, number: &str) {
        store
            .put_student(&StudentWrite {
                record: StudentRecord::from_pairs([("studentNumber", number), ("name", "N")]),
                created_at: Some(TimestampWrite::ServerNow),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sync_once_replaces_cache() {
        let store = MemoryStore::new();
        let cache = RosterCache::new();
        seed(&store, "2").await;
        seed(&store, "1").await;

        assert_eq!(sync_once(&store, &cache).await.unwrap(), 2);
        assert_eq!(cache.records()[0].student_number, "1");
        assert_eq!(cache.status(), SyncStatus::Connected);
    }

    #[tokio::test]
    async fn test_failed_snapshot_keeps_records() {
        let store = MemoryStore::new();
        let cache = RosterCache::new();
        seed(&store, "1").await;
        sync_once(&store, &cache).await.unwrap();

        store.set_fail_reads(true);
        assert!(sync_once(&store, &cache).await.is_err());
        assert_eq!(cache.len(), 1);
        assert!(matches!(cache.status(), SyncStatus::Error(_)));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let store = MemoryStore::new();
        seed(&store, "1").await;
        let cache = Arc::new(RosterCache::new());
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(run(
            store,
            cache.clone(),
            Duration::from_millis(10),
            rx,
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(cache.len(), 1);
    }
}
