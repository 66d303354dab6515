/*!
# Presence Reports

A browser-based form that turns a spreadsheet of staff clock events into
presence, absence and periodic reports, downloadable as one Excel workbook.

## Overview

The uploaded file holds one row per clock event, with at least a name column
(`Nom`) and a timestamp column (`Heure`). From it the application derives:

- the arrival and departure time of every person on every day they appear,
- the days each person is missing within the span covered by the file,
  with weekly and monthly counts,
- the number of presences per day, ISO week, month, quarter or year.

Every artifact is recomputed from the uploaded table on each request; none
is derived from another.

## Architecture

### Ingestion
- **loader**: first sheet of an xlsx/xls/ods workbook, or a CSV file
- **table**: cells, header lookup and timestamp parsing into records

### Computations
- **attendance**: first/last event per person and day
- **absence**: absent days, weekly and monthly counts
- **report**: presence counts per period bucket

### Output
- **sheet**: uniform tabular rendering shared by the JSON views and export
- **downloader**: multi-sheet XLSX workbook

### Web (feature `web`)
- **app**: routing and handlers
- **session**: per-browser store of the uploaded table
- **config**: environment-driven settings

## REST API Endpoints

- `POST /api/upload` - Multipart upload (`file` field) of the clock-in sheet
- `GET /api/presences` - Attendance summary
- `GET /api/absences` - Absence list and aggregates
- `GET /api/report?period=Mois` - Periodic report
- `POST /api/export` - Workbook with the requested artifacts
*/

pub mod absence;
pub mod attendance;
pub mod config;
pub mod downloader;
pub mod error;
pub mod loader;
pub mod report;
pub mod sheet;
pub mod table;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod session;

pub use absence::{AbsenceRow, AbsenceSummary, MonthlyAbsence, WeeklyAbsence, summarize_absences};
pub use attendance::{AttendanceRow, summarize_attendance};
pub use downloader::{ExportBundle, ExportRequest, to_xlsx};
pub use error::{ErrorKind, PresenceError};
pub use report::{Bucket, Period, Report, ReportRow, generate_report};
pub use table::{Cell, Record, Table};
