//! Delimited query wire format shared with the AppleScript side.
//!
//! A query is built on the Rust side as an AppleScript concatenation
//! expression and evaluated inside a `repeat` loop, yielding one line of
//! text per record:
//!
//! ```text
//!   id<EQ>9DD4F9E1C1B0A2F3<BR>name<EQ>Hey Jude<BR>artist<EQ>The Beatles
//! ```
//!
//! Fields are separated by `<BR>`, name and value by `<EQ>`, records by
//! newline. Values are **not** escaped on the wire; the tokens were picked
//! because they never occur in library metadata in practice. A value that
//! does contain one of them mis-splits — that stays out of contract here.
//! Field names, which we control, are checked against the reserved tokens
//! and rejected loudly.

use std::collections::HashMap;
use tracing::warn;

/// Separates name from value within one field.
pub const EQ: &str = "<EQ>";
/// Separates fields within one record.
pub const BR: &str = "<BR>";

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("field name {0:?} contains a reserved token")]
    ReservedToken(String),
    #[error("query has no fields")]
    Empty,
}

// ── encoder ───────────────────────────────────────────────────────────────────

/// Ordered field-name → AppleScript-expression mapping. Insertion order
/// fixes the field order in the rendered expression; the decoder does not
/// depend on it.
#[derive(Debug, Clone, Default)]
pub struct QuerySpec {
    fields: Vec<(String, String)>,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field. `expr` is any expression valid in the `tell` context the
    /// query runs in (e.g. `"persistent ID"`, `"name"`, `"(count tracks)"`).
    /// Expression contents are not validated; a bad expression surfaces as a
    /// bridge evaluation error.
    pub fn field(mut self, name: &str, expr: &str) -> Self {
        self.fields.push((name.to_string(), expr.to_string()));
        self
    }

    /// Render the AppleScript concatenation expression:
    ///
    /// ```text
    ///   "id<EQ>" & persistent ID & "<BR>name<EQ>" & name
    /// ```
    pub fn render(&self) -> Result<String, QueryError> {
        if self.fields.is_empty() {
            return Err(QueryError::Empty);
        }
        let mut out = String::new();
        for (i, (name, expr)) in self.fields.iter().enumerate() {
            if name.contains(EQ) || name.contains(BR) || name.contains('\n') {
                return Err(QueryError::ReservedToken(name.clone()));
            }
            let prefix = if i > 0 { BR } else { "" };
            if i > 0 {
                out.push_str(" & ");
            }
            out.push_str(&format!("\"{prefix}{name}{EQ}\" & {expr}"));
        }
        Ok(out)
    }
}

// ── decoder ───────────────────────────────────────────────────────────────────

/// One decoded record: raw string values keyed by field name. Typed
/// coercion (numbers, booleans, dates, rating scale) happens per entity in
/// `models`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: HashMap<String, String>,
}

impl Record {
    /// Value for `name`, or `""` when the field is absent. An empty-but-
    /// present field also returns `""`; use [`Record::get_opt`] to tell the
    /// two apart.
    pub fn get(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn get_opt(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Decode a single serialized record.
///
/// Lenient: a piece without an `<EQ>` separator becomes a field with an
/// empty value rather than failing the record — one malformed field must
/// not abort a whole list fetch.
pub fn parse_record(raw: &str) -> Record {
    let mut values = HashMap::new();
    for piece in raw.trim().split(BR) {
        if piece.is_empty() {
            continue;
        }
        match piece.split_once(EQ) {
            Some((name, value)) => {
                values.insert(name.to_string(), value.to_string());
            }
            None => {
                warn!("malformed record piece (no {} separator): {:?}", EQ, piece);
                values.insert(piece.to_string(), String::new());
            }
        }
    }
    Record { values }
}

/// Decode a newline-joined batch of serialized records, in input order.
///
/// Blank lines are skipped; this drops the trailing blank produced by the
/// script's final `& "\n"` while keeping a last record that arrives without
/// a terminating newline. Empty input yields an empty vec.
pub fn parse_records(raw: &str) -> Vec<Record> {
    raw.trim()
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(parse_record)
        .collect()
}
