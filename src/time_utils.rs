// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
///
/// Used for the store-assigned `createdAt`/`updatedAt` stamps and the
/// cache's snapshot time.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uses_z_suffix() {
        let date = DateTime::from_timestamp(1_767_225_600, 500).unwrap();
        assert_eq!(format_utc_rfc3339(date), "2026-01-01T00:00:00Z");
    }
}
