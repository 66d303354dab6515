use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};

use crate::error::Result;
use crate::table::{Record, Table};

/// First and last clock event of one person on one day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRow {
    pub date: NaiveDate,
    pub name: String,
    pub arrival: NaiveTime,
    pub departure: NaiveTime,
}

impl AttendanceRow {
    /// "HH:MM:SS - HH:MM:SS"
    pub fn time_range(&self) -> String {
        format!(
            "{} - {}",
            self.arrival.format("%H:%M:%S"),
            self.departure.format("%H:%M:%S")
        )
    }
}

/// Group records by (name, day) keeping the earliest and latest event
///
/// Rows come out ordered by name, then date.
pub fn summarize_records(records: &[Record]) -> Vec<AttendanceRow> {
    let mut days: BTreeMap<(&str, NaiveDate), (NaiveTime, NaiveTime)> = BTreeMap::new();

    for record in records {
        let time = record.timestamp.time();
        days.entry((record.name.as_str(), record.date()))
            .and_modify(|(first, last)| {
                if time < *first {
                    *first = time;
                }
                if time > *last {
                    *last = time;
                }
            })
            .or_insert((time, time));
    }

    days.into_iter()
        .map(|((name, date), (arrival, departure))| AttendanceRow {
            date,
            name: name.to_string(),
            arrival,
            departure,
        })
        .collect()
}

/// Attendance summary of a loaded table
pub fn summarize_attendance(table: &Table) -> Result<Vec<AttendanceRow>> {
    let records = table.records()?;
    Ok(summarize_records(&records))
}
