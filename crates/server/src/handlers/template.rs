use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart,
    },
    http::StatusCode,
    Json,
};
use deck_core::PresentationFormat;
use deck_pptx::TemplateAnalyzer;
use std::io::Cursor;

use crate::dtos::AnalyzeResponse;
use crate::error::AppError;

/// Name of the multipart field carrying the template.
pub const UPLOAD_FIELD: &str = "file";

pub struct Upload {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

pub async fn analyze_template(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let upload = read_upload(&mut multipart, UPLOAD_FIELD).await?;
    PresentationFormat::ensure_pptx(&upload.bytes, upload.filename.as_deref())?;

    let filename = upload.filename.unwrap_or_else(|| "upload.pptx".to_string());
    let size = upload.bytes.len();
    let bytes = upload.bytes;
    let profile =
        tokio::task::spawn_blocking(move || TemplateAnalyzer::new().analyze(Cursor::new(bytes)))
            .await??;

    log::info!(
        "Analyzed {} ({} bytes): {} layouts, {} theme colors",
        filename,
        size,
        profile.layouts.len(),
        profile.theme_colors.len()
    );

    Ok(Json(AnalyzeResponse {
        style_profile: profile,
    }))
}

/// Read the named file field; other fields are skipped.
pub async fn read_upload(multipart: &mut Multipart, field_name: &str) -> Result<Upload, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(field_name) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
        }

        return Ok(Upload {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    Err(AppError::BadRequest(format!(
        "Missing multipart field '{}'",
        field_name
    )))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}
