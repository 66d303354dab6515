#![allow(dead_code)]

use std::io::{Cursor, Read, Write};

use presences::table::{Cell, Table};
use rust_xlsxwriter::{Format, Workbook};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// The three clock events used throughout the documentation examples
pub const EXAMPLE: &[(&str, &str)] = &[
    ("A", "2024-01-01 08:00:00"),
    ("A", "2024-01-01 17:00:00"),
    ("B", "2024-01-02 09:00:00"),
];

pub fn table_from(events: &[(&str, &str)]) -> Table {
    Table::new(
        vec!["Nom".to_string(), "Heure".to_string(), "Service".to_string()],
        events
            .iter()
            .map(|(name, ts)| {
                vec![
                    Cell::Text(name.to_string()),
                    Cell::Text(ts.to_string()),
                    Cell::Text("Cardiologie".to_string()),
                ]
            })
            .collect(),
    )
}

/// Two weeks of irregular clock events for five people, spanning a new year
pub fn busy_events() -> Vec<(String, String)> {
    let names = ["Amina", "Bruno", "Chloé", "Driss", "Élodie"];
    let mut events = Vec::new();
    for day in 0..14u32 {
        let date = chrono::NaiveDate::from_ymd_opt(2023, 12, 25).unwrap()
            + chrono::Duration::days(i64::from(day));
        for (idx, name) in names.iter().enumerate() {
            // everyone skips some days, with a different rhythm each
            if (day as usize + idx) % (idx + 2) == 0 {
                continue;
            }
            let clocks = 1 + (day as usize * 7 + idx) % 3;
            for clock in 0..clocks {
                let hour = 17 - (clock as u32 * 4 + idx as u32) % 10;
                events.push((
                    name.to_string(),
                    format!("{} {:02}:{:02}:00", date, hour, (day * 11) % 60),
                ));
            }
        }
    }
    events
}

pub fn busy_table() -> Table {
    let events = busy_events();
    let borrowed: Vec<(&str, &str)> = events
        .iter()
        .map(|(n, t)| (n.as_str(), t.as_str()))
        .collect();
    table_from(&borrowed)
}

/// XLSX bytes with the timestamps written as text
pub fn text_workbook(headers: &[&str], rows: &[Vec<&str>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Pointages").unwrap();
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            worksheet.write_string((r + 1) as u32, col as u16, *value).unwrap();
        }
    }
    workbook.save_to_buffer().unwrap()
}

/// XLSX bytes with real date-time cells (serial numbers with a date format)
pub fn dated_workbook(events: &[(&str, f64)]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "Matricule").unwrap();
    worksheet.write_string(0, 1, "Nom").unwrap();
    worksheet.write_string(0, 2, "Heure").unwrap();
    for (r, (name, serial)) in events.iter().enumerate() {
        let row = (r + 1) as u32;
        worksheet.write_number(row, 0, (r + 100) as f64).unwrap();
        worksheet.write_string(row, 1, *name).unwrap();
        worksheet
            .write_number_with_format(row, 2, *serial, &date_format)
            .unwrap();
    }
    workbook.save_to_buffer().unwrap()
}

/// XLSX bytes whose `Heure` column holds times of day without a date
pub fn time_only_workbook(events: &[(&str, f64)]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let time_format = Format::new().set_num_format("hh:mm:ss");
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "Nom").unwrap();
    worksheet.write_string(0, 1, "Heure").unwrap();
    for (r, (name, fraction)) in events.iter().enumerate() {
        let row = (r + 1) as u32;
        worksheet.write_string(row, 0, *name).unwrap();
        worksheet
            .write_number_with_format(row, 1, *fraction, &time_format)
            .unwrap();
    }
    workbook.save_to_buffer().unwrap()
}

/// Rewrite `xl/workbook.xml` of an XLSX archive, copying every other part as is
pub fn patch_workbook_xml(bytes: &[u8], patch: impl Fn(&str) -> String) -> Vec<u8> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for idx in 0..archive.len() {
        let mut file = archive.by_index(idx).unwrap();
        if file.name() == "xl/workbook.xml" {
            let mut xml = String::new();
            file.read_to_string(&mut xml).unwrap();
            writer
                .start_file("xl/workbook.xml", SimpleFileOptions::default())
                .unwrap();
            writer.write_all(patch(&xml).as_bytes()).unwrap();
        } else {
            writer.raw_copy_file(file).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}
