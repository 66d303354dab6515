use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::absence::summarize_absences;
use crate::attendance::summarize_attendance;
use crate::config::Config;
use crate::downloader::{EXPORT_FILE_NAME, ExportRequest, XLSX_CONTENT_TYPE, export_table};
use crate::error::{ErrorKind, PresenceError};
use crate::loader;
use crate::report::{Period, generate_report};
use crate::session::{SESSION_COOKIE, SessionStore, Upload};
use crate::sheet::{Sheet, absence_sheets, attendance_sheet, report_sheet};

/// Multipart field carrying the uploaded file
pub const UPLOAD_FIELD: &str = "file";

pub struct AppState {
    pub sessions: SessionStore,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            sessions: SessionStore::new(config.session_ttl),
            config,
        }
    }
}

#[derive(Serialize)]
struct UploadResponse {
    status: &'static str,
    message: String,
    file_name: String,
    rows: usize,
    columns: Vec<String>,
}

#[derive(Serialize)]
struct SheetsResponse {
    status: &'static str,
    title: String,
    sheets: Vec<Sheet>,
}

#[derive(Deserialize)]
struct ReportQuery {
    period: Option<String>,
}

impl IntoResponse for PresenceError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::MissingColumns
            | ErrorKind::InvalidTimestamp
            | ErrorKind::EmptyWorkbook
            | ErrorKind::SpanTooLong => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::UnknownPeriod | ErrorKind::NothingToExport => StatusCode::BAD_REQUEST,
            ErrorKind::NoTable => StatusCode::CONFLICT,
            ErrorKind::Export => StatusCode::INTERNAL_SERVER_ERROR,
        };
        warn!("{}", self);
        (status, Json(self.report())).into_response()
    }
}

/// Build the application router around a shared state
pub fn router(state: Arc<AppState>) -> Router {
    let max_upload = state.config.max_upload_bytes;
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/", get(serve_index))
        .route("/api/upload", post(upload_file))
        .route("/api/presences", get(show_presences))
        .route("/api/absences", get(show_absences))
        .route("/api/report", get(show_report))
        .route("/api/export", post(export_workbook))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(max_upload))
        .with_state(state)
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.server_addr.clone();
    let state = Arc::new(AppState::new(config));

    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, router(state)).await?;

    Ok(())
}

async fn serve_index() -> Html<&'static str> {
    Html(include_str!("./static/index.html"))
}

fn session_upload(state: &AppState, jar: &CookieJar) -> Result<Upload, PresenceError> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| state.sessions.upload(cookie.value()))
        .ok_or(PresenceError::NoTable)
}

async fn upload_file(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Result<(CookieJar, Json<UploadResponse>), PresenceError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PresenceError::UnreadableWorkbook(e.to_string()))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let file_name = field.file_name().unwrap_or("upload.xlsx").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| PresenceError::UnreadableWorkbook(e.to_string()))?;
            upload = Some((file_name, data));
        }
    }

    let (file_name, data) = upload
        .filter(|(_, data)| !data.is_empty())
        .ok_or_else(|| PresenceError::UnreadableWorkbook("aucun fichier reçu".to_string()))?;

    let table = loader::load_upload(&file_name, &data)?;
    let rows = table.row_count();
    let columns = table.headers.clone();

    state.sessions.prune_expired();
    let session_id = match jar.get(SESSION_COOKIE) {
        Some(cookie) if state.sessions.contains(cookie.value()) => cookie.value().to_string(),
        _ => state.sessions.create(),
    };
    state.sessions.store(&session_id, &file_name, table);
    info!("session {} uploaded '{}' ({} rows)", session_id, file_name, rows);

    let cookie = Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    Ok((
        jar.add(cookie),
        Json(UploadResponse {
            status: "ok",
            message: "Fichier importé avec succès.".to_string(),
            file_name,
            rows,
            columns,
        }),
    ))
}

async fn show_presences(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<SheetsResponse>, PresenceError> {
    let upload = session_upload(&state, &jar)?;
    let rows = summarize_attendance(&upload.table)?;
    info!("attendance summary of '{}': {} rows", upload.file_name, rows.len());

    Ok(Json(SheetsResponse {
        status: "ok",
        title: "Données de Présence".to_string(),
        sheets: vec![attendance_sheet(&rows)],
    }))
}

async fn show_absences(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<SheetsResponse>, PresenceError> {
    let upload = session_upload(&state, &jar)?;
    let summary = summarize_absences(&upload.table)?;
    info!(
        "absence summary of '{}': {} absences",
        upload.file_name,
        summary.absences.len()
    );

    Ok(Json(SheetsResponse {
        status: "ok",
        title: "Données d'Absence".to_string(),
        sheets: absence_sheets(&summary),
    }))
}

async fn show_report(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<ReportQuery>,
) -> Result<Json<SheetsResponse>, PresenceError> {
    let upload = session_upload(&state, &jar)?;
    let period = match params.period.as_deref() {
        Some(label) => label.parse::<Period>()?,
        None => Period::default(),
    };
    let report = generate_report(&upload.table, period)?;
    info!(
        "{} report of '{}': {} buckets",
        period,
        upload.file_name,
        report.rows.len()
    );

    Ok(Json(SheetsResponse {
        status: "ok",
        title: format!("Rapport de Présences - Période: {}", period),
        sheets: vec![report_sheet(&report)],
    }))
}

async fn export_workbook(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<ExportRequest>,
) -> Result<Response, PresenceError> {
    let upload = session_upload(&state, &jar)?;
    let buffer = export_table(&upload.table, &request)?;

    let disposition = format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME);
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    )
        .into_response())
}
