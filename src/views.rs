// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pure view builders: roster table rows and student card HTML.
//!
//! Nothing here touches the cache or the store. The secret field is
//! masked here and only here; the records passed in are never modified.

use crate::models::StudentRecord;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const PLACEHOLDER: &str = "—";
const MASK_CHAR: char = '•';
const LOCKED_SECRET: &str = "••••••••";

/// Escape the characters that matter inside element content.
pub fn safe_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn or_placeholder(value: &str) -> &str {
    if value.is_empty() {
        PLACEHOLDER
    } else {
        value
    }
}

/// Bullets standing in for a secret of this length (4 to 10 of them).
pub fn mask_text(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let len = secret.chars().count().clamp(4, 10);
    std::iter::repeat(MASK_CHAR).take(len).collect()
}

/// True for a value that is only bullets, i.e. a masked secret echoed back.
pub fn is_mask(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value.chars().all(|c| c == MASK_CHAR)
}

/// Copy of `record` with the secret replaced by bullets.
pub fn mask_secret(record: &StudentRecord) -> StudentRecord {
    StudentRecord {
        secret: mask_text(&record.secret),
        ..record.clone()
    }
}

/// The record as it may be shown given the unlock state.
pub fn display_record(record: &StudentRecord, unlocked: bool) -> StudentRecord {
    if unlocked {
        record.clone()
    } else {
        mask_secret(record)
    }
}

/// Up to two upper-case initials, or a smiley for a blank name.
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .take(2)
        .filter_map(|part| part.chars().next())
        .flat_map(char::to_uppercase)
        .collect();
    if letters.is_empty() {
        "🙂".to_string()
    } else {
        letters
    }
}

/// One roster table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct RosterRow {
    #[serde(flatten)]
    pub student: StudentRecord,
    /// "RED", "BLUE" or "YELLOW".
    pub table_label: String,
    pub secret_masked: bool,
}

/// Everything the roster table needs to draw itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct RosterView {
    pub rows: Vec<RosterRow>,
    /// "0 students", "1 student", "12 students".
    pub count_line: String,
    /// Shown instead of rows when there are none.
    pub empty_message: Option<String>,
}

pub fn count_line(count: usize) -> String {
    format!("{} student{}", count, if count == 1 { "" } else { "s" })
}

/// Build the table view for `records`.
pub fn render_roster(records: &[StudentRecord], unlocked: bool) -> RosterView {
    let rows: Vec<RosterRow> = records
        .iter()
        .map(|r| RosterRow {
            student: display_record(r, unlocked),
            table_label: r.table_color.label().to_string(),
            secret_masked: !unlocked,
        })
        .collect();

    RosterView {
        count_line: count_line(rows.len()),
        empty_message: rows.is_empty().then(|| "No students yet.".to_string()),
        rows,
    }
}

fn secret_display(record: &StudentRecord, unlocked: bool) -> String {
    if unlocked {
        safe_text(or_placeholder(&record.secret))
    } else {
        LOCKED_SECRET.to_string()
    }
}

/// Card shown on screen for one student.
pub fn render_card_html(record: &StudentRecord, unlocked: bool) -> String {
    let locked_note = if unlocked {
        ""
    } else {
        r#" <span class="muted small">(Locked)</span>"#
    };
    let color = record.table_color;

    format!(
        r#"<div class="studentCard kidCard">
  <div class="kidTop">
    <div class="kidAvatar" aria-hidden="true">{initials}</div>
    <div>
      <p class="kidName">{name}</p>
      <p class="kidLine"># <b>{number}</b> · Section <b>{section}</b></p>
    </div>
    <div class="kidSticker"><span class="dot {color}"></span> TABLE {label}</div>
  </div>
  <div class="kidGrid">
    <div class="kidCell"><b>Email</b><div class="kidValue wrap">{email}</div></div>
    <div class="kidCell"><b>Chromebook #</b><div class="kidValue">{device}</div></div>
    <div class="kidCell"><b>Password</b><div class="kidValue">{secret}{locked_note}</div></div>
    <div class="kidCell"><b>Note</b><div class="kidValue wrap">{note}</div></div>
  </div>
</div>
"#,
        initials = safe_text(&initials(&record.name)),
        name = safe_text(or_placeholder(&record.name)),
        number = safe_text(or_placeholder(&record.student_number)),
        section = safe_text(or_placeholder(&record.section)),
        color = color.as_str(),
        label = color.label(),
        email = safe_text(or_placeholder(&record.email)),
        device = safe_text(or_placeholder(&record.device_number)),
        secret = secret_display(record, unlocked),
        locked_note = locked_note,
        note = safe_text(or_placeholder(&record.note)),
    )
}

/// Compact strip used when printing a single card.
pub fn render_print_html(record: &StudentRecord, unlocked: bool) -> String {
    format!(
        r#"<div class="printCard kidPrint">
  <div class="stripRow">
    <div class="stripAvatar" aria-hidden="true">{initials}</div>
    <div class="stripMain">
      <p class="stripName">{name}</p>
      <p class="stripLine"># {number} · {section}</p>
      <p class="stripLine">Email: {email}</p>
    </div>
    <div class="stripMeta">
      <div class="stripPill">TABLE {label}</div>
      <div class="stripTiny">CB: {device}</div>
      <div class="stripTiny">PW: {secret}</div>
    </div>
  </div>
</div>
"#,
        initials = safe_text(&initials(&record.name)),
        name = safe_text(or_placeholder(&record.name)),
        number = safe_text(or_placeholder(&record.student_number)),
        section = safe_text(or_placeholder(&record.section)),
        email = safe_text(or_placeholder(&record.email)),
        label = record.table_color.label(),
        device = safe_text(or_placeholder(&record.device_number)),
        secret = secret_display(record, unlocked),
    )
}
