#![cfg(not(tarpaulin_include))]

use presences::downloader::{EXPORT_FILE_NAME, ExportRequest, build_bundle, to_xlsx};
use presences::loader::load_table;
use presences::report::Period;
use std::env;
use std::process::ExitCode;

/// Batch rendition of the web form: every artifact of one file into one workbook
fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 4 {
        eprintln!(
            "Usage: {} <pointages.xlsx|csv> [sortie.xlsx] [Jour|Semaine|Mois|Trimestre|Année]",
            args[0]
        );
        return Ok(ExitCode::FAILURE);
    }

    let output = args.get(2).map(String::as_str).unwrap_or(EXPORT_FILE_NAME);
    let period: Period = match args.get(3) {
        Some(label) => label.parse()?,
        None => Period::default(),
    };

    let table = load_table(&args[1])?;
    let (bundle, errors) = build_bundle(&table, &ExportRequest::everything(period));
    for error in &errors {
        eprintln!("Erreur: {}", error);
    }
    if bundle.is_empty() {
        return Ok(ExitCode::FAILURE);
    }

    if let Some(attendance) = &bundle.attendance {
        println!("Présences: {} lignes", attendance.len());
    }
    if let Some(absences) = &bundle.absences {
        println!("Absences: {} jours", absences.absences.len());
    }
    if let Some(report) = &bundle.report {
        println!("Rapport ({}): {} périodes", report.period, report.rows.len());
    }

    std::fs::write(output, to_xlsx(&bundle)?)?;
    println!("Fichier écrit: {}", output);

    Ok(ExitCode::SUCCESS)
}
