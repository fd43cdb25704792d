// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Required-field checks for student records.

use crate::models::StudentRecord;

/// First constraint a record violates.
///
/// The `Display` text is what users see, both for single saves and as the
/// suffix of per-row import messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing studentNumber")]
    MissingStudentNumber,

    #[error("Missing name")]
    MissingName,

    #[error("Missing section")]
    MissingSection,
}

/// Check a normalized record, returning the first violation.
///
/// Order is studentNumber, name, section. Table color membership is
/// guaranteed by [`crate::models::TableColor`] itself.
pub fn validate(record: &StudentRecord) -> Option<ValidationError> {
    if record.student_number.is_empty() {
        return Some(ValidationError::MissingStudentNumber);
    }
    if record.name.is_empty() {
        return Some(ValidationError::MissingName);
    }
    if record.section.is_empty() {
        return Some(ValidationError::MissingSection);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(student_number: &str, name: &str, section: &str) -> StudentRecord {
        StudentRecord::from_pairs([
            ("studentNumber", student_number),
            ("name", name),
            ("section", section),
        ])
    }

    #[test]
    fn test_valid_record() {
        assert_eq!(validate(&record("1", "Alex", "P3")), None);
    }

    #[test]
    fn test_first_violation_wins() {
        assert_eq!(
            validate(&record("", "", "")),
            Some(ValidationError::MissingStudentNumber)
        );
        assert_eq!(
            validate(&record("1", "", "")),
            Some(ValidationError::MissingName)
        );
        assert_eq!(
            validate(&record("1", "Alex", "   ")),
            Some(ValidationError::MissingSection)
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ValidationError::MissingName.to_string(),
            "Missing name"
        );
        assert_eq!(
            ValidationError::MissingStudentNumber.to_string(),
            "Missing studentNumber"
        );
    }
}
