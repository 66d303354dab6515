use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Category of a failed operation, as reported to the user interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingColumns,
    InvalidTimestamp,
    EmptyWorkbook,
    SpanTooLong,
    UnknownPeriod,
    NoTable,
    NothingToExport,
    Export,
}

/// Every way an ingestion, computation or export can fail
///
/// Messages are user-facing and therefore written in French, like the
/// rest of the interface.
#[derive(Debug, Error)]
pub enum PresenceError {
    #[error("Le fichier ne contient pas les colonnes nécessaires : {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("Horodatage illisible à la ligne {row} : '{value}'")]
    InvalidTimestamp { row: usize, value: String },

    #[error("Le fichier Excel doit contenir au moins une feuille visible.")]
    EmptyWorkbook,

    #[error("Impossible de lire le fichier : {0}")]
    UnreadableWorkbook(String),

    #[error(
        "La période du {first} au {last} produirait {rows} absences, \
         au-delà de la capacité d'une feuille Excel."
    )]
    SpanTooLong {
        first: NaiveDate,
        last: NaiveDate,
        rows: usize,
    },

    #[error("Période de rapport inconnue : '{0}'")]
    UnknownPeriod(String),

    #[error("Veuillez importer un fichier pour commencer.")]
    NoTable,

    #[error("Aucun résultat à exporter.")]
    NothingToExport,

    #[error("Erreur lors de la génération du fichier Excel : {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),
}

impl PresenceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PresenceError::MissingColumns { .. } => ErrorKind::MissingColumns,
            PresenceError::InvalidTimestamp { .. } => ErrorKind::InvalidTimestamp,
            PresenceError::EmptyWorkbook | PresenceError::UnreadableWorkbook(_) => {
                ErrorKind::EmptyWorkbook
            }
            PresenceError::SpanTooLong { .. } => ErrorKind::SpanTooLong,
            PresenceError::UnknownPeriod(_) => ErrorKind::UnknownPeriod,
            PresenceError::NoTable => ErrorKind::NoTable,
            PresenceError::NothingToExport => ErrorKind::NothingToExport,
            PresenceError::Export(_) => ErrorKind::Export,
        }
    }

    /// Structured descriptor handed to the interface instead of the raw error
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            status: "error",
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub status: &'static str,
    pub kind: ErrorKind,
    pub message: String,
}

pub type Result<T> = std::result::Result<T, PresenceError>;
