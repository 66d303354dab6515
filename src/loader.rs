use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{Data, Reader, Sheets, open_workbook_auto, open_workbook_auto_from_rs};
use log::info;

use crate::error::{PresenceError, Result};
use crate::table::{Cell, Table};

/// Load the first sheet of a workbook file (xlsx, xls or ods)
///
/// # Arguments
/// * `filepath` - Path to the workbook to load
///
/// # Returns
/// * `Result<Table>` - Header row and data rows of the first sheet
///
/// # Examples
/// ```no_run
/// use presences::loader::from_excel;
///
/// match from_excel("pointages.xlsx") {
///     Ok(table) => println!("{} rows loaded", table.row_count()),
///     Err(e) => eprintln!("{}", e),
/// }
/// ```
pub fn from_excel(filepath: impl AsRef<Path>) -> Result<Table> {
    let mut workbook =
        open_workbook_auto(filepath).map_err(|e| PresenceError::UnreadableWorkbook(e.to_string()))?;
    first_sheet(&mut workbook)
}

/// Load the first sheet of an in-memory workbook, as received from an upload
pub fn from_excel_bytes(bytes: &[u8]) -> Result<Table> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| PresenceError::UnreadableWorkbook(e.to_string()))?;
    first_sheet(&mut workbook)
}

fn first_sheet<RS: Read + Seek>(workbook: &mut Sheets<RS>) -> Result<Table> {
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(PresenceError::EmptyWorkbook)?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| PresenceError::UnreadableWorkbook(e.to_string()))?;

    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let mut rows = range.rows();

    let headers = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| convert_cell(cell).as_text())
            .collect(),
        None => Vec::new(),
    };
    let rows = rows
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();

    let table = Table {
        headers,
        rows,
        first_line: first_row + 2,
    };
    info!(
        "loaded sheet '{}' with {} columns and {} rows",
        sheet_name,
        table.headers.len(),
        table.row_count()
    );
    Ok(table)
}

fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        // time-only cells keep their clock reading so the error can show it
        Data::DateTime(dt) if dt.is_datetime() && dt.as_f64() < 1.0 => match dt.as_duration() {
            Some(time) => Cell::Text(format!(
                "{:02}:{:02}:{:02}",
                time.num_hours(),
                time.num_minutes() % 60,
                time.num_seconds() % 60
            )),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTime(dt) if dt.is_datetime() => dt
            .as_datetime()
            .map(Cell::DateTime)
            .unwrap_or(Cell::Number(dt.as_f64())),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}

/// Load a CSV export of the clock-in sheet
///
/// The delimiter is `;` when the header line uses it and has no comma,
/// as spreadsheet software does in French locales; `,` otherwise.
pub fn from_csv<R: Read>(mut reader: R) -> Result<Table> {
    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .map_err(|e| PresenceError::UnreadableWorkbook(e.to_string()))?;
    let content = content.trim_start_matches('\u{feff}');

    let header_line = content.lines().next().unwrap_or("");
    let delimiter = if header_line.contains(';') && !header_line.contains(',') {
        b';'
    } else {
        b','
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let headers = csv_reader
        .headers()
        .map_err(|e| PresenceError::UnreadableWorkbook(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(|e| PresenceError::UnreadableWorkbook(e.to_string()))?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(Table::new(headers, rows))
}

fn is_csv(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// Load an uploaded file, choosing the format from its name
pub fn load_upload(file_name: &str, bytes: &[u8]) -> Result<Table> {
    if is_csv(file_name) {
        from_csv(bytes)
    } else {
        from_excel_bytes(bytes)
    }
}

/// Detect file type and load appropriate format
///
/// # Examples
/// ```no_run
/// use presences::loader::load_table;
///
/// let table = load_table("pointages.csv").expect("readable file");
/// println!("columns: {:?}", table.headers);
/// ```
pub fn load_table(filepath: impl AsRef<Path>) -> Result<Table> {
    let path = filepath.as_ref();
    let is_csv_file = path.to_str().map(is_csv).unwrap_or(false);

    if is_csv_file {
        let file = std::fs::File::open(path)
            .map_err(|e| PresenceError::UnreadableWorkbook(e.to_string()))?;
        from_csv(file)
    } else {
        from_excel(path)
    }
}
