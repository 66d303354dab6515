use log::{info, warn};
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, Worksheet};
use serde::Deserialize;

use crate::absence::{AbsenceSummary, summarize_absences};
use crate::attendance::{AttendanceRow, summarize_attendance};
use crate::error::{PresenceError, Result};
use crate::report::{Period, Report, generate_report};
use crate::sheet::{Sheet, SheetValue, absence_sheets, attendance_sheet, report_sheet};
use crate::table::Table;

pub const EXPORT_FILE_NAME: &str = "Rapport_Presences.xlsx";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const MIN_COLUMN_WIDTH: usize = 10;
const MAX_COLUMN_WIDTH: usize = 50;

/// Artifacts computed for one download
#[derive(Debug, Clone, Default)]
pub struct ExportBundle {
    pub attendance: Option<Vec<AttendanceRow>>,
    pub absences: Option<AbsenceSummary>,
    pub report: Option<Report>,
}

impl ExportBundle {
    pub fn is_empty(&self) -> bool {
        self.attendance.is_none() && self.absences.is_none() && self.report.is_none()
    }

    /// Sheets of every computed artifact, in workbook order
    pub fn sheets(&self) -> Vec<Sheet> {
        let mut sheets = Vec::new();
        if let Some(attendance) = &self.attendance {
            sheets.push(attendance_sheet(attendance));
        }
        if let Some(absences) = &self.absences {
            sheets.extend(absence_sheets(absences));
        }
        if let Some(report) = &self.report {
            sheets.push(report_sheet(report));
        }
        sheets
    }
}

/// Which artifacts a download should contain
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub presences: bool,
    #[serde(default)]
    pub absences: bool,
    /// Report period label; no report when absent
    #[serde(default)]
    pub period: Option<String>,
}

impl ExportRequest {
    pub fn everything(period: Period) -> Self {
        Self {
            presences: true,
            absences: true,
            period: Some(period.label().to_string()),
        }
    }
}

/// Recompute every requested artifact from the table
///
/// A failing computation leaves its artifact out of the bundle; its error
/// is returned alongside so the caller can report it.
pub fn build_bundle(table: &Table, request: &ExportRequest) -> (ExportBundle, Vec<PresenceError>) {
    let mut bundle = ExportBundle::default();
    let mut errors = Vec::new();

    if request.presences {
        match summarize_attendance(table) {
            Ok(rows) => bundle.attendance = Some(rows),
            Err(e) => errors.push(e),
        }
    }
    if request.absences {
        match summarize_absences(table) {
            Ok(summary) => bundle.absences = Some(summary),
            Err(e) => errors.push(e),
        }
    }
    if let Some(label) = &request.period {
        match label.parse::<Period>().and_then(|period| generate_report(table, period)) {
            Ok(report) => bundle.report = Some(report),
            Err(e) => errors.push(e),
        }
    }

    (bundle, errors)
}

/// Build the requested workbook straight from the table
///
/// Fails only when no sheet could be produced, with the first computation
/// error if there was one.
pub fn export_table(table: &Table, request: &ExportRequest) -> Result<Vec<u8>> {
    let (bundle, errors) = build_bundle(table, request);
    if bundle.is_empty() {
        return Err(errors
            .into_iter()
            .next()
            .unwrap_or(PresenceError::NothingToExport));
    }
    for error in &errors {
        warn!("left out of export: {}", error);
    }
    to_xlsx(&bundle)
}

/// Convert the computed artifacts to an XLSX workbook
///
/// Artifacts that were not computed get no sheet at all.
///
/// # Returns
/// * `Result<Vec<u8>>` - XLSX file content, or `NothingToExport` for an empty bundle
///
/// # Examples
/// ```
/// use presences::downloader::{ExportBundle, to_xlsx};
///
/// assert!(to_xlsx(&ExportBundle::default()).is_err());
/// ```
pub fn to_xlsx(bundle: &ExportBundle) -> Result<Vec<u8>> {
    sheets_to_xlsx(&bundle.sheets())
}

/// Write each sheet as a worksheet of one workbook
pub fn sheets_to_xlsx(sheets: &[Sheet]) -> Result<Vec<u8>> {
    if sheets.is_empty() {
        return Err(PresenceError::NothingToExport);
    }

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0x4472C4))
        .set_font_color(Color::White)
        .set_border(FormatBorder::Thin);

    let mut workbook = Workbook::new();
    for sheet in sheets {
        workbook.push_worksheet(write_sheet(sheet, &header_format)?);
    }

    let buffer = workbook.save_to_buffer()?;
    info!(
        "exported {} sheets ({} bytes)",
        sheets.len(),
        buffer.len()
    );
    Ok(buffer)
}

fn write_sheet(sheet: &Sheet, header_format: &Format) -> Result<Worksheet> {
    let mut worksheet = Worksheet::new();
    worksheet.set_name(&sheet.name)?;

    for (col, header) in sheet.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, header_format)?;
    }

    for (idx, row) in sheet.rows.iter().enumerate() {
        let row_num = (idx + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            match value {
                SheetValue::Text(text) => {
                    worksheet.write_string(row_num, col as u16, text)?;
                }
                SheetValue::Number(number) => {
                    worksheet.write_number(row_num, col as u16, *number)?;
                }
            }
        }
    }

    for (col, width) in column_widths(sheet).into_iter().enumerate() {
        worksheet.set_column_width(col as u16, width as f64)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    Ok(worksheet)
}

fn column_widths(sheet: &Sheet) -> Vec<usize> {
    sheet
        .columns
        .iter()
        .enumerate()
        .map(|(col, header)| {
            let longest = sheet
                .rows
                .iter()
                .filter_map(|row| row.get(col))
                .map(|value| match value {
                    SheetValue::Text(text) => text.chars().count(),
                    SheetValue::Number(number) => number.to_string().len(),
                })
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0);
            (longest + 2).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
        })
        .collect()
}
