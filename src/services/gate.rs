// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Teacher password gate for viewing the secret field.
//!
//! Only a SHA-256 digest of the teacher password is kept. Unlocking lasts
//! for the lifetime of the process (the "session") until `lock` is called.

use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use subtle::ConstantTimeEq;

/// Gate failures shown to the teacher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("Password cannot be empty.")]
    EmptyPassword,

    #[error("Passwords do not match.")]
    Mismatch,

    #[error("No teacher password set yet.")]
    NotConfigured,

    #[error("A teacher password is already set; unlock first to change it.")]
    AlreadyConfigured,

    #[error("Wrong teacher password.")]
    WrongPassword,
}

/// Hex SHA-256 digest of a password.
pub fn password_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Lock state plus the stored password digest.
#[derive(Debug, Default)]
pub struct UnlockGate {
    digest: RwLock<Option<String>>,
    unlocked: AtomicBool,
}

impl UnlockGate {
    /// Create a locked gate, optionally seeded with a known digest.
    pub fn new(digest: Option<String>) -> Self {
        Self {
            digest: RwLock::new(digest.map(|d| d.trim().to_lowercase())),
            unlocked: AtomicBool::new(false),
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked.load(Ordering::SeqCst)
    }

    pub fn is_configured(&self) -> bool {
        self.digest
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Set the teacher password, or replace it while unlocked. Leaves the
    /// gate unlocked.
    pub fn set_password(&self, password: &str, confirm: &str) -> Result<(), GateError> {
        if password.trim().is_empty() {
            return Err(GateError::EmptyPassword);
        }
        if password != confirm {
            return Err(GateError::Mismatch);
        }

        let mut digest = self.digest.write().unwrap_or_else(|e| e.into_inner());
        if digest.is_some() && !self.is_unlocked() {
            tracing::warn!("Rejected password change while locked");
            return Err(GateError::AlreadyConfigured);
        }
        *digest = Some(password_digest(password));
        drop(digest);
        self.unlocked.store(true, Ordering::SeqCst);
        tracing::info!("Teacher password set; secret view unlocked");
        Ok(())
    }

    /// Unlock if `attempt` matches the stored password.
    pub fn unlock(&self, attempt: &str) -> Result<(), GateError> {
        let stored = self
            .digest
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(GateError::NotConfigured)?;

        let candidate = password_digest(attempt);
        if bool::from(candidate.as_bytes().ct_eq(stored.as_bytes())) {
            self.unlocked.store(true, Ordering::SeqCst);
            tracing::info!("Secret view unlocked");
            Ok(())
        } else {
            tracing::warn!("Rejected unlock attempt");
            Err(GateError::WrongPassword)
        }
    }

    pub fn lock(&self) {
        self.unlocked.store(false, Ordering::SeqCst);
        tracing::info!("Secret view locked");
    }
}
