use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use crate::attendance::{AttendanceRow, summarize_attendance};
use crate::error::{PresenceError, Result};
use crate::table::Table;

/// Granularity of a periodic report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    #[default]
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::Day,
        Period::Week,
        Period::Month,
        Period::Quarter,
        Period::Year,
    ];

    /// Label shown in the period selector and used as column header
    pub fn label(&self) -> &'static str {
        match self {
            Period::Day => "Jour",
            Period::Week => "Semaine",
            Period::Month => "Mois",
            Period::Quarter => "Trimestre",
            Period::Year => "Année",
        }
    }

    pub fn bucket(&self, date: NaiveDate) -> Bucket {
        match self {
            Period::Day => Bucket::Day(date),
            Period::Week => {
                let week = date.iso_week();
                Bucket::Week {
                    year: week.year(),
                    week: week.week(),
                }
            }
            Period::Month => Bucket::Month {
                year: date.year(),
                month: date.month(),
            },
            Period::Quarter => Bucket::Quarter {
                year: date.year(),
                quarter: (date.month() - 1) / 3 + 1,
            },
            Period::Year => Bucket::Year(date.year()),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Period {
    type Err = PresenceError;

    /// Accepts the French labels as well as the English names, in any case
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "jour" | "day" => Ok(Period::Day),
            "semaine" | "week" => Ok(Period::Week),
            "mois" | "month" => Ok(Period::Month),
            "trimestre" | "quarter" => Ok(Period::Quarter),
            "année" | "annee" | "year" => Ok(Period::Year),
            _ => Err(PresenceError::UnknownPeriod(s.to_string())),
        }
    }
}

/// Grouping key derived from a date; ordering is chronological within a period
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Bucket {
    Day(NaiveDate),
    Week { year: i32, week: u32 },
    Month { year: i32, month: u32 },
    Quarter { year: i32, quarter: u32 },
    Year(i32),
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bucket::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Bucket::Week { year, week } => write!(f, "{}-W{:02}", year, week),
            Bucket::Month { year, month } => write!(f, "{}-{:02}", year, month),
            Bucket::Quarter { year, quarter } => write!(f, "{}Q{}", year, quarter),
            Bucket::Year(year) => write!(f, "{}", year),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub bucket: Bucket,
    pub count: usize,
}

/// Number of presence rows per period bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub period: Period,
    pub rows: Vec<ReportRow>,
}

impl Report {
    pub fn total(&self) -> usize {
        self.rows.iter().map(|row| row.count).sum()
    }
}

/// Count presence rows (one per person and day) per bucket
pub fn report_from_attendance(attendance: &[AttendanceRow], period: Period) -> Report {
    let mut buckets: BTreeMap<Bucket, usize> = BTreeMap::new();
    for row in attendance {
        *buckets.entry(period.bucket(row.date)).or_default() += 1;
    }

    Report {
        period,
        rows: buckets
            .into_iter()
            .map(|(bucket, count)| ReportRow { bucket, count })
            .collect(),
    }
}

/// Periodic presence report of a loaded table
pub fn generate_report(table: &Table, period: Period) -> Result<Report> {
    let attendance = summarize_attendance(table)?;
    Ok(report_from_attendance(&attendance, period))
}
