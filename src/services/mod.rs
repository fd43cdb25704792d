// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod gate;
pub mod import;
pub mod roster;
pub mod students;
pub mod sync;

pub use gate::{GateError, UnlockGate};
pub use import::{import_csv, CancelFlag, ImportOptions, ImportRegistry, ImportReport};
pub use roster::{RosterCache, SyncStatus};
pub use students::KeyLocks;
