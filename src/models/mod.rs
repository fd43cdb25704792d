// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod student;
pub mod validate;

pub use student::{normalize, StoredStudent, StudentRecord, TableColor};
pub use validate::{validate, ValidationError};
