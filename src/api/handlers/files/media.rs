use crate::api::error::AppError;
use crate::utils::validation::is_safe_key;
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

/// Types a browser would execute in our origin are only offered as downloads.
fn is_active_content(mime: &mime::Mime) -> bool {
    *mime == mime::TEXT_HTML
        || *mime == mime::TEXT_XML
        || *mime == mime::IMAGE_SVG
        || mime.essence_str() == "application/xhtml+xml"
        || mime.essence_str() == "application/xml"
}

fn content_disposition(mime: &mime::Mime, key: &str) -> String {
    let name = key.rsplit('/').next().unwrap_or(key);
    let kind = if is_active_content(mime) {
        "attachment"
    } else {
        "inline"
    };
    format!(
        "{}; filename*=UTF-8''{}",
        kind,
        utf8_percent_encode(name, NON_ALPHANUMERIC)
    )
}

#[utoipa::path(
    get,
    path = "/media/{key}",
    params(
        ("key" = String, Path, description = "Storage key of the uploaded file")
    ),
    responses(
        (status = 200, description = "Stored file content"),
        (status = 404, description = "No file stored under this key")
    ),
    tag = "files"
)]
pub async fn download_media(
    State(state): State<crate::AppState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let not_found = || AppError::NotFound("File not found".to_string());

    if !is_safe_key(&key) {
        return Err(not_found());
    }

    let exists = state
        .storage
        .exists(&key)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;
    if !exists {
        return Err(not_found());
    }

    let data = state
        .storage
        .open(&key)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    let mime = mime_guess::from_path(&key).first_or_octet_stream();
    tracing::debug!("serving media {} ({}, {} bytes)", key, mime, data.len());

    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&mime, &key)),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
        ],
        data,
    )
        .into_response())
}
