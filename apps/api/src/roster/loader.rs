//! Record Loader — reads an uploaded delimited roster into typed records.
//!
//! Column presence is the only hard schema check: every missing column is
//! reported together in one `SchemaError`. Cell contents are trusted apart from
//! the rating, which is coerced into 1..=5, and the recipient key, which must be
//! usable as an archive entry name.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::roster::models::{CaseRecord, FeedbackRecord};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Fatal roster problems. Any of these aborts the batch before a single backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Missing required column(s): {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    /// `line` is the 1-based line of the uploaded file, header included.
    #[error("Recipient key {key:?} on line {line} cannot be used as a file name")]
    UnsafeKey { key: String, line: u64 },

    #[error("Recipient keys {first:?} and {second:?} both map to archive entry {normalized:?}")]
    KeyCollision {
        first: String,
        second: String,
        normalized: String,
    },

    #[error("Unable to read roster: {0}")]
    Malformed(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Column layouts
// ────────────────────────────────────────────────────────────────────────────

/// Header names for the exam roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamColumns {
    pub recipient: String,
    pub primary_diagnosis: String,
    pub differentials: [String; 3],
}

impl Default for ExamColumns {
    fn default() -> Self {
        Self {
            recipient: "Please enter email.".to_string(),
            primary_diagnosis: "Top Diagnosis".to_string(),
            differentials: [
                "Diagnosis 1".to_string(),
                "Diagnosis 2".to_string(),
                "Diagnosis 3".to_string(),
            ],
        }
    }
}

impl ExamColumns {
    fn required(&self) -> Vec<&str> {
        let mut names = vec![self.recipient.as_str(), self.primary_diagnosis.as_str()];
        names.extend(self.differentials.iter().map(String::as_str));
        names
    }
}

/// Header names for the preceptor feedback roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackColumns {
    pub recipient: String,
    pub rating: String,
    pub first_answer: String,
    pub second_answer: String,
}

impl Default for FeedbackColumns {
    fn default() -> Self {
        Self {
            recipient: "AAMC ID".to_string(),
            rating: "3 Multiple Choice Value".to_string(),
            first_answer: "1 Answer Text".to_string(),
            second_answer: "2 Answer Text".to_string(),
        }
    }
}

impl FeedbackColumns {
    fn required(&self) -> Vec<&str> {
        vec![
            self.recipient.as_str(),
            self.rating.as_str(),
            self.first_answer.as_str(),
            self.second_answer.as_str(),
        ]
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Loading
// ────────────────────────────────────────────────────────────────────────────

/// Loads exam case records in input row order.
pub fn load_case_records(
    raw: &[u8],
    delimiter: u8,
    columns: &ExamColumns,
) -> Result<Vec<CaseRecord>, SchemaError> {
    let table = read_table(raw, delimiter)?;
    let idx = table.require(&columns.required())?;

    let records: Vec<CaseRecord> = table
        .rows
        .iter()
        .map(|row| CaseRecord {
            recipient_key: cell(row, idx[0]),
            primary_diagnosis: cell(row, idx[1]),
            differentials: [cell(row, idx[2]), cell(row, idx[3]), cell(row, idx[4])],
        })
        .collect();

    check_recipient_keys(
        table
            .source_lines()
            .zip(records.iter().map(CaseRecord::recipient_key)),
    )?;
    debug!("Loaded {} case records", records.len());
    Ok(records)
}

/// Loads feedback records in input row order. Ratings are coerced, never rejected.
pub fn load_feedback_records(
    raw: &[u8],
    delimiter: u8,
    columns: &FeedbackColumns,
) -> Result<Vec<FeedbackRecord>, SchemaError> {
    let table = read_table(raw, delimiter)?;
    let idx = table.require(&columns.required())?;

    let records: Vec<FeedbackRecord> = table
        .rows
        .iter()
        .map(|row| FeedbackRecord {
            recipient_key: cell(row, idx[0]),
            rating: coerce_rating(row.get(idx[1]).unwrap_or_default()),
            first_answer: cell(row, idx[2]),
            second_answer: cell(row, idx[3]),
        })
        .collect();

    check_recipient_keys(
        table
            .source_lines()
            .zip(records.iter().map(FeedbackRecord::recipient_key)),
    )?;
    debug!("Loaded {} feedback records", records.len());
    Ok(records)
}

/// Header row plus the first few data rows, for showing the upload back to the user.
#[derive(Debug, Clone, Serialize)]
pub struct RosterPreview {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
}

pub fn preview_roster(raw: &[u8], delimiter: u8, limit: usize) -> Result<RosterPreview, SchemaError> {
    let table = read_table(raw, delimiter)?;
    let rows = table
        .rows
        .iter()
        .take(limit)
        .map(|row| row.iter().map(str::to_string).collect())
        .collect();

    Ok(RosterPreview {
        headers: table.headers,
        rows,
        total_rows: table.rows.len(),
    })
}

/// Rounds to the nearest integer and clamps into 1..=5.
/// Non-numeric input falls to the lower bound.
pub fn coerce_rating(raw: &str) -> u8 {
    match raw.trim().parse::<f64>() {
        Ok(value) if !value.is_nan() => {
            value.round().clamp(MIN_RATING as f64, MAX_RATING as f64) as u8
        }
        _ => {
            warn!("Non-numeric rating {raw:?}, clamping to {MIN_RATING}");
            MIN_RATING
        }
    }
}

/// The name a recipient key occupies in the archive namespace. Two keys with the
/// same normalized form would overwrite each other on case-insensitive filesystems.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase()
}

// ────────────────────────────────────────────────────────────────────────────
// Internals
// ────────────────────────────────────────────────────────────────────────────

struct Table {
    headers: Vec<String>,
    rows: Vec<csv::StringRecord>,
}

impl Table {
    /// Resolves every required header to its index, or names all the absent ones.
    fn require(&self, required: &[&str]) -> Result<Vec<usize>, SchemaError> {
        let mut indices = Vec::with_capacity(required.len());
        let mut missing = Vec::new();

        for name in required {
            match self.headers.iter().position(|h| h == name) {
                Some(i) => indices.push(i),
                None => missing.push(name.to_string()),
            }
        }

        if missing.is_empty() {
            Ok(indices)
        } else {
            Err(SchemaError::MissingColumns { columns: missing })
        }
    }

    /// Line in the uploaded file where each kept row starts.
    fn source_lines(&self) -> impl Iterator<Item = u64> + '_ {
        self.rows
            .iter()
            .map(|row| row.position().map_or(0, csv::Position::line))
    }
}

fn read_table(raw: &[u8], delimiter: u8) -> Result<Table, SchemaError> {
    let raw = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(raw);

    let headers = reader
        .headers()
        .map_err(|e| SchemaError::Malformed(format!("unable to read headers: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| SchemaError::Malformed(format!("unable to read row: {e}")))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(record);
    }

    Ok(Table { headers, rows })
}

fn cell(row: &csv::StringRecord, idx: usize) -> String {
    row.get(idx).unwrap_or_default().to_string()
}

fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && key != "."
        && key != ".."
        && !key
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control())
}

/// Rejects keys that can't be archive entry names, and distinct keys that would
/// share one entry.
fn check_recipient_keys<'a>(
    keys: impl Iterator<Item = (u64, &'a str)>,
) -> Result<(), SchemaError> {
    let mut seen: HashMap<String, &str> = HashMap::new();

    for (line, key) in keys {
        if !is_safe_key(key) {
            return Err(SchemaError::UnsafeKey {
                key: key.to_string(),
                line,
            });
        }

        let normalized = normalize_key(key);
        match seen.get(normalized.as_str()) {
            Some(first) if *first != key => {
                return Err(SchemaError::KeyCollision {
                    first: first.to_string(),
                    second: key.to_string(),
                    normalized,
                });
            }
            Some(_) => {}
            None => {
                seen.insert(normalized, key);
            }
        }
    }

    Ok(())
}
