// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Minimal CSV reader for roster uploads, plus the downloadable template.
//!
//! The reader is a single pass over the characters with one bit of state
//! (inside or outside a quoted span). It never fails: an unterminated
//! quote simply runs to the end of the input.

use crate::models::student::fields;
use std::collections::HashMap;

/// Suggested file name for the template download.
pub const TEMPLATE_FILE_NAME: &str = "students_template.csv";

/// Media type for CSV downloads.
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

const TEMPLATE_SAMPLE_ROWS: [&str; 2] = [
    "20260012,Alex Santos,P3-Ruby,alex@email.com,SamplePW,red,14,Needs charger",
    "20260013,Mia Cruz,P3-Ruby,mia@email.com,,blue,7,",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Unquoted,
    Quoted,
}

/// Parse delimited text into rows of fields.
///
/// - `""` inside quotes is a literal quote; any other quote closes the span.
/// - Outside quotes, `,` ends a field and `\n` ends a row.
/// - `\r` is dropped everywhere, so CRLF and LF inputs parse the same.
/// - Rows whose fields are all blank are skipped.
pub fn parse(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut state = ScanState::Unquoted;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            ScanState::Quoted => match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => state = ScanState::Unquoted,
                '\r' => {}
                _ => field.push(c),
            },
            ScanState::Unquoted => match c {
                '"' => state = ScanState::Quoted,
                ',' => row.push(std::mem::take(&mut field)),
                '\n' => {
                    row.push(std::mem::take(&mut field));
                    push_row(&mut rows, std::mem::take(&mut row));
                }
                '\r' => {}
                _ => field.push(c),
            },
        }
    }

    row.push(field);
    push_row(&mut rows, row);
    rows
}

fn push_row(rows: &mut Vec<Vec<String>>, row: Vec<String>) {
    if row.iter().any(|v| !v.trim().is_empty()) {
        rows.push(row);
    }
}

/// The import template: header line plus sample rows.
pub fn template() -> String {
    let mut out = fields::ALL.join(",");
    out.push('\n');
    for line in TEMPLATE_SAMPLE_ROWS {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Column name → position lookup built from a header row.
#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    /// Index a header row. Names are trimmed; a repeated name keeps its
    /// last position.
    pub fn new(header: &[String]) -> Self {
        let positions = header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_string(), i))
            .collect();
        Self { positions }
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    /// First of `required` that the header does not name.
    pub fn first_missing<'a>(&self, required: &[&'a str]) -> Option<&'a str> {
        required.iter().copied().find(|c| !self.contains(c))
    }

    /// Pair each recognized column with its value in `row`.
    ///
    /// Columns absent from the header are omitted; columns present in the
    /// header but past the end of a short row read as empty.
    pub fn extract<'r>(&self, row: &'r [String]) -> Vec<(&'static str, &'r str)> {
        fields::ALL
            .iter()
            .filter_map(|&column| {
                self.position(column).map(|i| {
                    let value = row.get(i).map(String::as_str).unwrap_or("");
                    (column, value)
                })
            })
            .collect()
    }
}
