//! Axum route handlers for roster upload, preview and batch download.

use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use chrono::Utc;

use crate::document::archive::{Archive, ARCHIVE_MIME};
use crate::errors::AppError;
use crate::roster::loader::{preview_roster, RosterPreview};
use crate::state::AppState;

pub const EXAM_ARCHIVE_NAME: &str = "exams.tar.gz";
pub const EVALUATION_ARCHIVE_NAME: &str = "evaluations.tar.gz";
const PREVIEW_ROWS: usize = 5;

/// POST /api/v1/roster/preview
///
/// Headers and the first few rows of an uploaded roster, before committing to a batch.
pub async fn handle_preview(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<RosterPreview>, AppError> {
    let raw = read_upload(multipart).await?;
    let preview = preview_roster(&raw, state.runner.settings().delimiter, PREVIEW_ROWS)?;
    Ok(Json(preview))
}

/// POST /api/v1/exams
///
/// Generates one exam per recipient and returns them all as a single archive.
pub async fn handle_exam_batch(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let raw = read_upload(multipart).await?;
    let archive = state.runner.run_exam_batch(&raw).await?;
    archive_response(&archive, EXAM_ARCHIVE_NAME)
}

/// POST /api/v1/evaluations
///
/// Classifies preceptor feedback and returns one evaluation document per learner.
pub async fn handle_evaluation_batch(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let raw = read_upload(multipart).await?;
    let archive = state.runner.run_evaluation_batch(&raw).await?;
    archive_response(&archive, EVALUATION_ARCHIVE_NAME)
}

/// Bytes of the multipart field named `file`.
async fn read_upload(mut multipart: Multipart) -> Result<Bytes, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            return field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read file data: {e}")));
        }
    }
    Err(AppError::Validation("No file provided".to_string()))
}

fn archive_response(archive: &Archive, file_name: &str) -> Result<Response, AppError> {
    let mtime = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
    let body = Bytes::from(archive.to_tar_gz(mtime)?);

    Ok((
        [
            (header::CONTENT_TYPE, ARCHIVE_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
        .into_response())
}
