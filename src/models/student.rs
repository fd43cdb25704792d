// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Student record model and input normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Wire names of the record fields, in template/column order.
pub mod fields {
    pub const STUDENT_NUMBER: &str = "studentNumber";
    pub const NAME: &str = "name";
    pub const SECTION: &str = "section";
    pub const EMAIL: &str = "email";
    pub const SECRET: &str = "pw";
    pub const TABLE_COLOR: &str = "tableColor";
    pub const DEVICE_NUMBER: &str = "chromebookNumber";
    pub const NOTE: &str = "note";

    /// All recognized columns.
    pub const ALL: [&str; 8] = [
        STUDENT_NUMBER,
        NAME,
        SECTION,
        EMAIL,
        SECRET,
        TABLE_COLOR,
        DEVICE_NUMBER,
        NOTE,
    ];
}

/// Table color a student sits at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum TableColor {
    #[default]
    Red,
    Blue,
    Yellow,
}

impl TableColor {
    /// Parse a color name, ignoring case and surrounding whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "red" => Some(Self::Red),
            "blue" => Some(Self::Blue),
            "yellow" => Some(Self::Yellow),
            _ => None,
        }
    }

    /// Parse a color name, falling back to red for anything unrecognized.
    pub fn parse_or_default(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
        }
    }

    /// Upper-case label used on cards ("RED").
    pub fn label(self) -> &'static str {
        match self {
            Self::Red => "RED",
            Self::Blue => "BLUE",
            Self::Yellow => "YELLOW",
        }
    }
}

impl std::fmt::Display for TableColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized student card.
///
/// `student_number` is the record key. The `secret` field is stored and
/// searched in the clear; masking happens only in the view layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub student_number: String,
    pub name: String,
    pub section: String,
    pub email: String,
    #[serde(rename = "pw")]
    pub secret: String,
    pub table_color: TableColor,
    #[serde(rename = "chromebookNumber")]
    pub device_number: String,
    pub note: String,
}

impl StudentRecord {
    /// Build a record from `(column, value)` pairs, e.g. a CSV row.
    ///
    /// Unknown columns are ignored and missing ones default to empty.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let map: Map<String, Value> = pairs
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), Value::String(v.as_ref().to_string())))
            .collect();
        normalize(&map)
    }

    /// Flatten back into a wire-named field map.
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut map = Map::new();
        let mut put = |key: &str, value: &str| {
            map.insert(key.to_string(), Value::String(value.to_string()));
        };
        put(fields::STUDENT_NUMBER, &self.student_number);
        put(fields::NAME, &self.name);
        put(fields::SECTION, &self.section);
        put(fields::EMAIL, &self.email);
        put(fields::SECRET, &self.secret);
        put(fields::TABLE_COLOR, self.table_color.as_str());
        put(fields::DEVICE_NUMBER, &self.device_number);
        put(fields::NOTE, &self.note);
        map
    }

    /// Lower-cased text that search queries are matched against.
    ///
    /// Includes the secret field regardless of the unlock state.
    pub fn search_haystack(&self) -> String {
        [
            self.student_number.as_str(),
            self.name.as_str(),
            self.section.as_str(),
            self.email.as_str(),
            self.table_color.as_str(),
            self.device_number.as_str(),
            self.note.as_str(),
            self.secret.as_str(),
        ]
        .join(" ")
        .to_lowercase()
    }
}

/// A record as read back from the store, with its timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredStudent {
    #[serde(flatten)]
    pub record: StudentRecord,
    /// Stamped by the store when the document is first written.
    pub created_at: Option<DateTime<Utc>>,
    /// Stamped by the store on every write.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Coerce an arbitrary JSON value to trimmed text.
fn coerce(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string().trim().to_string(),
    }
}

/// Coerce a loosely-typed field map into a well-shaped record.
///
/// Never fails: missing fields become empty strings and an unknown table
/// color becomes red. Rejection is left to [`crate::models::validate`].
pub fn normalize(raw: &Map<String, Value>) -> StudentRecord {
    let get = |key: &str| coerce(raw.get(key));

    StudentRecord {
        student_number: get(fields::STUDENT_NUMBER),
        name: get(fields::NAME),
        section: get(fields::SECTION),
        email: get(fields::EMAIL),
        secret: get(fields::SECRET),
        table_color: TableColor::parse_or_default(&get(fields::TABLE_COLOR)),
        device_number: get(fields::DEVICE_NUMBER),
        note: get(fields::NOTE),
    }
}
