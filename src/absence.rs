use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, NaiveDate};

use crate::error::{PresenceError, Result};
use crate::table::{Record, Table};

/// A day of the data span on which a person has no clock event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbsenceRow {
    pub name: String,
    pub date: NaiveDate,
}

impl AbsenceRow {
    /// ISO year and week number of the absence
    pub fn iso_week(&self) -> (i32, u32) {
        let week = self.date.iso_week();
        (week.year(), week.week())
    }

    pub fn month(&self) -> (i32, u32) {
        (self.date.year(), self.date.month())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyAbsence {
    pub name: String,
    pub year: i32,
    pub week: u32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyAbsence {
    pub name: String,
    pub year: i32,
    pub month: u32,
    pub count: usize,
}

/// Flat absence list together with its weekly and monthly counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbsenceSummary {
    pub absences: Vec<AbsenceRow>,
    pub weekly: Vec<WeeklyAbsence>,
    pub monthly: Vec<MonthlyAbsence>,
}

/// Data rows a worksheet can hold below its header
pub const MAX_ABSENCE_ROWS: usize = 1_048_575;

/// Inclusive span from the earliest to the latest day in the records
pub fn date_span(records: &[Record]) -> Option<(NaiveDate, NaiveDate)> {
    let first = records.iter().map(Record::date).min()?;
    let last = records.iter().map(Record::date).max()?;
    Some((first, last))
}

/// Absences of every person over the span covered by all records
///
/// People are listed in order of first appearance, dates ascending.
/// Aggregates are keyed by year as well as week or month so that spans
/// crossing a new year never merge unrelated periods.
pub fn summarize_records(records: &[Record]) -> AbsenceSummary {
    let Some((first, last)) = date_span(records) else {
        return AbsenceSummary::default();
    };

    let mut names: Vec<&str> = Vec::new();
    let mut present: HashMap<&str, HashSet<NaiveDate>> = HashMap::new();
    for record in records {
        let days = present.entry(record.name.as_str()).or_insert_with(|| {
            names.push(record.name.as_str());
            HashSet::new()
        });
        days.insert(record.date());
    }

    let mut absences = Vec::new();
    for name in names {
        let days = &present[name];
        absences.extend(
            first
                .iter_days()
                .take_while(|day| *day <= last)
                .filter(|day| !days.contains(day))
                .map(|date| AbsenceRow {
                    name: name.to_string(),
                    date,
                }),
        );
    }

    let mut weekly: BTreeMap<(&str, i32, u32), usize> = BTreeMap::new();
    let mut monthly: BTreeMap<(&str, i32, u32), usize> = BTreeMap::new();
    for absence in &absences {
        let (year, week) = absence.iso_week();
        *weekly.entry((absence.name.as_str(), year, week)).or_default() += 1;
        let (year, month) = absence.month();
        *monthly.entry((absence.name.as_str(), year, month)).or_default() += 1;
    }

    let weekly = weekly
        .into_iter()
        .map(|((name, year, week), count)| WeeklyAbsence {
            name: name.to_string(),
            year,
            week,
            count,
        })
        .collect();
    let monthly = monthly
        .into_iter()
        .map(|((name, year, month), count)| MonthlyAbsence {
            name: name.to_string(),
            year,
            month,
            count,
        })
        .collect();

    AbsenceSummary {
        absences,
        weekly,
        monthly,
    }
}

/// Absence summary of a loaded table
pub fn summarize_absences(table: &Table) -> Result<AbsenceSummary> {
    let records = table.records()?;
    check_absence_volume(&records)?;
    Ok(summarize_records(&records))
}

/// Refuse spans whose absence list could not fit in one worksheet
///
/// A single mistyped year is enough to stretch the span over centuries,
/// so the count is checked before any row is built.
fn check_absence_volume(records: &[Record]) -> Result<()> {
    let Some((first, last)) = date_span(records) else {
        return Ok(());
    };
    let days = (last - first).num_days() as usize + 1;
    let present: HashSet<(&str, NaiveDate)> = records
        .iter()
        .map(|record| (record.name.as_str(), record.date()))
        .collect();
    let people = present.iter().map(|(name, _)| *name).collect::<HashSet<_>>().len();

    let rows = people.saturating_mul(days).saturating_sub(present.len());
    if rows > MAX_ABSENCE_ROWS {
        return Err(PresenceError::SpanTooLong { first, last, rows });
    }
    Ok(())
}
