use crate::api::error::AppError;
use crate::templates::detail_url;
use axum::{
    extract::{Multipart, State, multipart::MultipartRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use super::types::*;

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = UploadRequest, description = "File upload", content_type = "multipart/form-data"),
    responses(
        (status = 302, description = "File stored, redirect to its detail page"),
        (status = 400, description = "No file part in the form"),
        (status = 413, description = "File exceeds the configured size limit"),
        (status = 500, description = "Storage or notification failure")
    ),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<crate::AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let result: Result<Response, AppError> = async {
        let upload = UploadForm::from_multipart(&mut multipart)
            .await?
            .require_file()?;

        let record = state.file_service.upload(upload).await?;

        Ok((
            StatusCode::FOUND,
            [(header::LOCATION, detail_url(record.id))],
        )
            .into_response())
    }
    .await;

    if let Err(e) = &result {
        // Drain what is left of the body so the client sees the response
        // instead of a reset connection.
        tracing::warn!("Upload failed: {}. Consuming remaining stream...", e);
        while let Ok(Some(mut field)) = multipart.next_field().await {
            while let Ok(Some(_)) = field.chunk().await {}
        }
    }

    result
}
