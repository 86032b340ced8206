use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use deck_core::{PresentationFormat, PPTX_MIME_TYPE};

use crate::dtos::{GenerateRequest, PatchRequest};
use crate::error::AppError;
use crate::startup::AppState;

pub const SPEC_JSON_HEADER: HeaderName = HeaderName::from_static("x-spec-json");
pub const THUMBNAILS_HEADER: HeaderName = HeaderName::from_static("x-thumbnails");

pub async fn generate_deck(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let spec = request
        .parse_deck_spec()
        .map_err(|e| AppError::BadRequest(format!("Invalid deckSpec: {}", e)))?;

    let template = state.fetcher.fetch(&request.template_url).await?;
    PresentationFormat::ensure_pptx(&template, Some(&request.template_url))?;

    let slide_count = spec.slides.len();
    let spec_json = request.deck_spec;
    let bytes =
        tokio::task::spawn_blocking(move || deck_pptx::generate_deck(&template, &spec)).await??;

    log::info!(
        "Generated deck with {} slides ({} bytes)",
        slide_count,
        bytes.len()
    );

    let mut response = pptx_response(bytes, "attachment; filename=\"generated.pptx\"");
    let headers = response.headers_mut();
    match HeaderValue::from_str(&ascii_json(&spec_json)) {
        Ok(value) => {
            headers.insert(SPEC_JSON_HEADER, value);
        }
        Err(e) => log::warn!("Deck spec not representable as a header: {}", e),
    }
    headers.insert(THUMBNAILS_HEADER, HeaderValue::from_static("[]"));

    Ok(response)
}

pub async fn patch_deck(
    State(state): State<AppState>,
    payload: Result<Json<PatchRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let source = state.fetcher.fetch(&request.pptx_url).await?;
    PresentationFormat::ensure_pptx(&source, Some(&request.pptx_url))?;

    let ops = request.patch_ops;
    let op_count = ops.ops.len();
    let bytes = tokio::task::spawn_blocking(move || deck_pptx::patch_deck(&source, &ops)).await??;

    log::info!("Patched deck with {} operations ({} bytes)", op_count, bytes.len());
    Ok(pptx_response(bytes, "attachment; filename=\"patched.pptx\""))
}

fn pptx_response(bytes: Vec<u8>, disposition: &'static str) -> Response {
    let mut response = Body::from(bytes).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(PPTX_MIME_TYPE));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static(disposition),
    );
    response
}

/// Serialize JSON with every non-ASCII character escaped as `\uXXXX`, so the
/// result is a valid header value.
pub fn ascii_json(value: &serde_json::Value) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}
