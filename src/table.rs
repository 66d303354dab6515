use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::error::{PresenceError, Result};

lazy_static! {
    static ref NAME_HEADER: Regex = Regex::new(r"(?i)^\s*(nom|name)\s*$").unwrap();
    static ref TIME_HEADER: Regex = Regex::new(r"(?i)^\s*(heure|timestamp)\s*$").unwrap();
}

/// Canonical column names, used in messages and in exported sheets
pub const NAME_COLUMN: &str = "Nom";
pub const TIME_COLUMN: &str = "Heure";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// A single cell of an ingested sheet
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Display form of the cell, used for person names
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Interpret the cell as a clock event
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::DateTime(dt) => Some(*dt),
            Cell::Number(n) => from_excel_serial(*n),
            Cell::Text(s) => parse_timestamp_text(s),
            Cell::Empty | Cell::Bool(_) => None,
        }
    }
}

/// One clock event: who, and when
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub timestamp: NaiveDateTime,
}

impl Record {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// First sheet of an uploaded file: header names plus data rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    /// Sheet line (1-based) of the first data row, for error messages
    pub first_line: usize,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            headers,
            rows,
            first_line: 2,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.iter().filter(|row| !row.iter().all(Cell::is_empty)).count()
    }

    fn find_column(&self, pattern: &Regex) -> Option<usize> {
        self.headers.iter().position(|header| pattern.is_match(header))
    }

    /// Locate the name and timestamp columns
    pub fn required_columns(&self) -> Result<(usize, usize)> {
        let name = self.find_column(&NAME_HEADER);
        let time = self.find_column(&TIME_HEADER);
        match (name, time) {
            (Some(name), Some(time)) => Ok((name, time)),
            _ => {
                let mut missing = Vec::new();
                if name.is_none() {
                    missing.push(NAME_COLUMN.to_string());
                }
                if time.is_none() {
                    missing.push(TIME_COLUMN.to_string());
                }
                Err(PresenceError::MissingColumns { missing })
            }
        }
    }

    /// Extract every clock event of the table
    ///
    /// Rows without a name or without a timestamp are skipped. A timestamp
    /// that is present but unreadable fails the whole extraction.
    pub fn records(&self) -> Result<Vec<Record>> {
        let (name_col, time_col) = self.required_columns()?;
        let mut records = Vec::with_capacity(self.rows.len());

        for (idx, row) in self.rows.iter().enumerate() {
            let line = self.first_line + idx;
            let name_cell = row.get(name_col).unwrap_or(&Cell::Empty);
            let time_cell = row.get(time_col).unwrap_or(&Cell::Empty);

            if name_cell.is_empty() || time_cell.is_empty() {
                debug!("skipping incomplete row {}", line);
                continue;
            }

            let timestamp =
                time_cell
                    .as_timestamp()
                    .ok_or_else(|| PresenceError::InvalidTimestamp {
                        row: line,
                        value: time_cell.as_text(),
                    })?;

            records.push(Record {
                name: name_cell.as_text(),
                timestamp,
            });
        }

        Ok(records)
    }
}

/// Convert a spreadsheet serial day number (epoch 1899-12-30) to a date-time
///
/// Sub-second precision is rounded to the millisecond. Serials below one
/// hold a time of day without a date and are rejected.
pub fn from_excel_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

/// Parse a textual timestamp in ISO or day-first French notation
pub fn parse_timestamp_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
