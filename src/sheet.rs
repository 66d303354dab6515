use serde::Serialize;

use crate::absence::AbsenceSummary;
use crate::attendance::AttendanceRow;
use crate::report::Report;
use crate::table::NAME_COLUMN;

pub const PRESENCE_SHEET: &str = "Présences";
pub const ABSENCE_SHEET: &str = "Absences";
pub const WEEKLY_ABSENCE_SHEET: &str = "Absences par Semaine";
pub const MONTHLY_ABSENCE_SHEET: &str = "Absences par Mois";
pub const REPORT_SHEET: &str = "Rapport";

pub const TIME_RANGE_COLUMN: &str = "Heure d'arrivée et de sortie";
pub const REPORT_COUNT_COLUMN: &str = "Nombre de présences";

/// Value of a rendered cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SheetValue {
    Text(String),
    Number(f64),
}

impl From<String> for SheetValue {
    fn from(value: String) -> Self {
        SheetValue::Text(value)
    }
}

impl From<&str> for SheetValue {
    fn from(value: &str) -> Self {
        SheetValue::Text(value.to_string())
    }
}

impl From<usize> for SheetValue {
    fn from(value: usize) -> Self {
        SheetValue::Number(value as f64)
    }
}

impl From<u32> for SheetValue {
    fn from(value: u32) -> Self {
        SheetValue::Number(f64::from(value))
    }
}

impl From<i32> for SheetValue {
    fn from(value: i32) -> Self {
        SheetValue::Number(f64::from(value))
    }
}

/// A named, rendered result table
///
/// The same rendering backs the JSON views and the exported workbook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SheetValue>>,
}

impl Sheet {
    fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }
}

pub fn attendance_sheet(rows: &[AttendanceRow]) -> Sheet {
    let mut sheet = Sheet::new(PRESENCE_SHEET, &["Date", NAME_COLUMN, TIME_RANGE_COLUMN]);
    sheet.rows = rows
        .iter()
        .map(|row| {
            vec![
                row.date.format("%Y-%m-%d").to_string().into(),
                row.name.as_str().into(),
                row.time_range().into(),
            ]
        })
        .collect();
    sheet
}

/// Flat list, weekly counts and monthly counts, in that order
pub fn absence_sheets(summary: &AbsenceSummary) -> Vec<Sheet> {
    let mut absences = Sheet::new(
        ABSENCE_SHEET,
        &[NAME_COLUMN, "Date", "Semaine", "Mois"],
    );
    absences.rows = summary
        .absences
        .iter()
        .map(|row| {
            vec![
                row.name.as_str().into(),
                row.date.format("%Y-%m-%d").to_string().into(),
                row.iso_week().1.into(),
                row.month().1.into(),
            ]
        })
        .collect();

    let mut weekly = Sheet::new(
        WEEKLY_ABSENCE_SHEET,
        &[NAME_COLUMN, "Année", "Semaine", "Absences_Semaine"],
    );
    weekly.rows = summary
        .weekly
        .iter()
        .map(|w| vec![w.name.as_str().into(), w.year.into(), w.week.into(), w.count.into()])
        .collect();

    let mut monthly = Sheet::new(
        MONTHLY_ABSENCE_SHEET,
        &[NAME_COLUMN, "Année", "Mois", "Absences_Mois"],
    );
    monthly.rows = summary
        .monthly
        .iter()
        .map(|m| vec![m.name.as_str().into(), m.year.into(), m.month.into(), m.count.into()])
        .collect();

    vec![absences, weekly, monthly]
}

pub fn report_sheet(report: &Report) -> Sheet {
    let mut sheet = Sheet::new(REPORT_SHEET, &[report.period.label(), REPORT_COUNT_COLUMN]);
    sheet.rows = report
        .rows
        .iter()
        .map(|row| vec![row.bucket.to_string().into(), row.count.into()])
        .collect();
    sheet
}
