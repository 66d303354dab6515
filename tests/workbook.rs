mod common;

use std::io::Cursor;

use calamine::{Data, DataType, Reader, Xlsx};
use presences::downloader::{ExportRequest, build_bundle, export_table, to_xlsx};
use presences::error::{ErrorKind, PresenceError};
use presences::loader::{from_excel_bytes, load_table, load_upload};
use presences::sheet::{
    ABSENCE_SHEET, MONTHLY_ABSENCE_SHEET, PRESENCE_SHEET, REPORT_SHEET, WEEKLY_ABSENCE_SHEET,
};
use presences::{ExportBundle, Period, summarize_attendance};

use common::{
    EXAMPLE, dated_workbook, patch_workbook_xml, table_from, text_workbook, time_only_workbook,
};

fn open(bytes: Vec<u8>) -> Xlsx<Cursor<Vec<u8>>> {
    Xlsx::new(Cursor::new(bytes)).expect("valid workbook")
}

#[test]
fn first_sheet_with_text_timestamps() {
    let bytes = text_workbook(
        &["Nom", "Heure", "Commentaire"],
        &[
            vec!["A", "2024-01-01 08:00:00", "badge"],
            vec!["A", "01/01/2024 17:00", ""],
            vec!["B", "2024-01-02T09:00:00", "badge"],
        ],
    );
    let table = from_excel_bytes(&bytes).unwrap();
    assert_eq!(table.headers, vec!["Nom", "Heure", "Commentaire"]);
    assert_eq!(table.row_count(), 3);

    let rows = summarize_attendance(&table).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].time_range(), "08:00:00 - 17:00:00");
}

#[test]
fn first_sheet_with_date_cells() {
    // 45292 is 2024-01-01; 0.75 of a day is 18:00
    let bytes = dated_workbook(&[("Inès", 45292.25), ("Inès", 45292.75), ("Marc", 45293.5)]);
    let table = load_upload("pointages.xlsx", &bytes).unwrap();
    let rows = summarize_attendance(&table).unwrap();
    assert_eq!(rows[0].name, "Inès");
    assert_eq!(rows[0].time_range(), "06:00:00 - 18:00:00");
    assert_eq!(rows[1].date.to_string(), "2024-01-02");
    assert_eq!(rows[1].time_range(), "12:00:00 - 12:00:00");
}

#[test]
fn date_cells_follow_the_1904_date_system() {
    // 2024-01-01 is serial 43830 when days count from 1904-01-01
    let bytes = dated_workbook(&[("Inès", 43830.0 + 1.0 / 3.0), ("Inès", 43830.75)]);
    let bytes = patch_workbook_xml(&bytes, |xml| {
        xml.replacen("<workbookPr ", "<workbookPr date1904=\"1\" ", 1)
    });

    let table = load_upload("pointages.xlsx", &bytes).unwrap();
    let rows = summarize_attendance(&table).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date.to_string(), "2024-01-01");
    assert_eq!(rows[0].time_range(), "08:00:00 - 18:00:00");
}

#[test]
fn time_without_date_is_an_invalid_timestamp() {
    let bytes = time_only_workbook(&[("A", 1.0 / 3.0)]);
    let table = load_upload("pointages.xlsx", &bytes).unwrap();

    let err = summarize_attendance(&table).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTimestamp);
    let message = err.to_string();
    assert!(message.contains("ligne 2"), "{}", message);
    assert!(message.contains("08:00:00"), "{}", message);
}

#[test]
fn workbook_without_sheets_is_empty() {
    let bytes = text_workbook(&["Nom", "Heure"], &[vec!["A", "2024-01-01 08:00:00"]]);
    let bytes = patch_workbook_xml(&bytes, |xml| {
        let start = xml.find("<sheets>").expect("sheets element");
        let end = xml.find("</sheets>").expect("sheets end") + "</sheets>".len();
        format!("{}<sheets/>{}", &xml[..start], &xml[end..])
    });

    let err = load_upload("pointages.xlsx", &bytes).unwrap_err();
    assert!(matches!(err, PresenceError::EmptyWorkbook), "{:?}", err);
    assert_eq!(err.kind(), ErrorKind::EmptyWorkbook);
}

#[test]
fn loads_workbooks_and_csv_from_disk() {
    let dir = tempfile::tempdir().unwrap();

    let xlsx_path = dir.path().join("pointages.xlsx");
    std::fs::write(
        &xlsx_path,
        text_workbook(&["Nom", "Heure"], &[vec!["A", "2024-01-01 08:00:00"]]),
    )
    .unwrap();
    assert_eq!(load_table(&xlsx_path).unwrap().row_count(), 1);

    let csv_path = dir.path().join("pointages.csv");
    std::fs::write(&csv_path, "Nom,Heure\nA,2024-01-01 08:00:00\nB,2024-01-02 09:00:00\n").unwrap();
    let table = load_table(&csv_path).unwrap();
    assert_eq!(table.records().unwrap().len(), 2);
}

#[test]
fn unreadable_upload_is_a_workbook_error() {
    let err = load_upload("pointages.xlsx", b"PK but not really").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyWorkbook);
}

#[test]
fn export_writes_every_sheet_in_order() {
    let table = table_from(EXAMPLE);
    let bytes = export_table(&table, &ExportRequest::everything(Period::Day)).unwrap();

    let mut workbook = open(bytes);
    assert_eq!(
        workbook.sheet_names(),
        vec![
            PRESENCE_SHEET,
            ABSENCE_SHEET,
            WEEKLY_ABSENCE_SHEET,
            MONTHLY_ABSENCE_SHEET,
            REPORT_SHEET
        ]
    );

    let presences = workbook.worksheet_range(PRESENCE_SHEET).unwrap();
    assert_eq!(presences.height(), 3);
    assert_eq!(
        presences.get((1, 2)),
        Some(&Data::String("08:00:00 - 17:00:00".to_string()))
    );

    let report = workbook.worksheet_range(REPORT_SHEET).unwrap();
    assert_eq!(report.get((0, 0)), Some(&Data::String("Jour".to_string())));
    assert_eq!(report.get((2, 1)).and_then(|count| count.as_f64()), Some(1.0));
}

#[test]
fn export_skips_what_was_not_requested() {
    let table = table_from(EXAMPLE);
    let request = ExportRequest {
        absences: true,
        ..ExportRequest::default()
    };
    let workbook = open(export_table(&table, &request).unwrap());
    assert_eq!(
        workbook.sheet_names(),
        vec![ABSENCE_SHEET, WEEKLY_ABSENCE_SHEET, MONTHLY_ABSENCE_SHEET]
    );
}

#[test]
fn failed_computation_is_left_out() {
    let table = table_from(EXAMPLE);
    let request = ExportRequest {
        presences: true,
        period: Some("Décennie".to_string()),
        ..ExportRequest::default()
    };
    let (bundle, errors) = build_bundle(&table, &request);
    assert!(bundle.attendance.is_some());
    assert!(bundle.report.is_none());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::UnknownPeriod);

    let workbook = open(to_xlsx(&bundle).unwrap());
    assert_eq!(workbook.sheet_names(), vec![PRESENCE_SHEET]);
}

#[test]
fn nothing_to_export_reports_the_cause() {
    let table = table_from(EXAMPLE);
    let err = export_table(&table, &ExportRequest::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NothingToExport);

    let only_bad_period = ExportRequest {
        period: Some("Décennie".to_string()),
        ..ExportRequest::default()
    };
    let err = export_table(&table, &only_bad_period).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownPeriod);

    assert!(to_xlsx(&ExportBundle::default()).is_err());
}
