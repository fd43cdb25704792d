// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Roster Cards: classroom student cards backed by Firestore
//!
//! This crate provides the backend for a teacher's roster: a live local
//! mirror of the `students` collection with search, single-record edits,
//! CSV bulk import, a password gate over the secret field, and printable
//! card HTML.

pub mod config;
pub mod csv_codec;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod views;

use config::Config;
use db::{FirestoreDb, StudentStore};
use services::{ImportRegistry, KeyLocks, RosterCache, UnlockGate};
use std::sync::Arc;

/// Shared application state.
pub struct AppState<S = FirestoreDb> {
    pub config: Config,
    pub db: S,
    pub roster: Arc<RosterCache>,
    pub gate: UnlockGate,
    pub key_locks: KeyLocks,
    /// At most one CSV import runs at a time.
    pub active_import: ImportRegistry,
}

impl<S: StudentStore> AppState<S> {
    pub fn new(config: Config, db: S) -> Self {
        let gate = UnlockGate::new(config.teacher_password_sha256.clone());
        Self {
            config,
            db,
            roster: Arc::new(RosterCache::new()),
            gate,
            key_locks: KeyLocks::default(),
            active_import: ImportRegistry::new(),
        }
    }
}
