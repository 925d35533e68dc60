use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use salesreport_core::{
    prepare_dataset, render_report, ReportBundle, ReportError, EXPORT_FILE_NAME, EXPORT_MIME,
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::query::parse_request;
use super::{AppState, Session};
use crate::html;

const DEFAULT_UPLOAD_NAME: &str = "upload.csv";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("session not found")]
    SessionNotFound,

    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Report(ReportError),
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        if err.is_user_facing() {
            Self::Rejected(err.to_string())
        } else {
            Self::Report(err)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::SessionNotFound => {
                (StatusCode::NOT_FOUND, Html(html::not_found_page())).into_response()
            }
            Self::Rejected(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(html::upload_page(Some(&message))),
            )
                .into_response(),
            Self::Multipart(err) => {
                warn!(error = %err, "multipart upload rejected");
                (err.status(), Html(html::upload_page(Some(&err.body_text())))).into_response()
            }
            Self::Report(err) => {
                error!(error = %err, "render pass failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(html::upload_page(Some(
                        "The report could not be generated from this file.",
                    ))),
                )
                    .into_response()
            }
        }
    }
}

pub async fn index() -> Html<String> {
    Html(html::upload_page(None))
}

pub async fn not_found() -> AppError {
    AppError::SessionNotFound
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut replaces: Option<Uuid> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field
                    .file_name()
                    .filter(|file_name| !file_name.is_empty())
                    .unwrap_or(DEFAULT_UPLOAD_NAME)
                    .to_string();
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    upload = Some((file_name, bytes.to_vec()));
                }
            }
            "replaces" => {
                replaces = Uuid::parse_str(field.text().await?.trim()).ok();
            }
            _ => {}
        }
    }

    let Some((file_name, bytes)) = upload else {
        return Err(AppError::Rejected(
            "Please choose a CSV file to upload.".to_string(),
        ));
    };

    let session = Session::new(file_name, bytes);
    let prepared = prepare_dataset(&session.bytes).inspect_err(|err| {
        warn!(
            file_name = %session.file_name,
            fingerprint = %session.fingerprint,
            error = %err,
            "upload failed validation"
        );
    })?;

    info!(
        session = %session.id,
        file_name = %session.file_name,
        fingerprint = %session.fingerprint,
        bytes = session.bytes.len(),
        rows = prepared.df.height(),
        dropped_rows = prepared.dropped_rows,
        "upload accepted"
    );

    let id = session.id;
    let evicted = {
        let mut sessions = state.sessions.lock().await;
        if let Some(previous) = replaces {
            if sessions.remove(&previous).is_some() {
                info!(session = %previous, "discarded replaced session");
            }
        }
        sessions.insert(session)
    };
    if !evicted.is_empty() {
        info!(evicted = evicted.len(), "evicted oldest sessions");
    }

    Ok(Redirect::to(&format!("/report/{id}")))
}

pub async fn report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Html<String>, AppError> {
    let (session, bundle) = render(&state, &id, &params).await?;
    Ok(Html(html::report_page(&session, &bundle)))
}

pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let (session, bundle) = render(&state, &id, &params).await?;
    info!(
        session = %session.id,
        rows = bundle.export.row_count,
        "export downloaded"
    );
    Ok((
        [
            (header::CONTENT_TYPE, EXPORT_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        bundle.export.bytes,
    )
        .into_response())
}

pub async fn bundle_json(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<ReportBundle>, AppError> {
    let (_, bundle) = render(&state, &id, &params).await?;
    Ok(Json(bundle))
}

/// Looks the session up, releases the lock, then runs a full render pass.
async fn render(
    state: &AppState,
    raw_id: &str,
    params: &[(String, String)],
) -> Result<(Session, ReportBundle), AppError> {
    let id = Uuid::parse_str(raw_id).map_err(|_| AppError::SessionNotFound)?;
    let session = state
        .sessions
        .lock()
        .await
        .get(&id)
        .ok_or(AppError::SessionNotFound)?;

    let request = parse_request(params);
    let bundle = render_report(&session.bytes, &request, &state.settings)?;
    Ok((session, bundle))
}
