use crate::api::error::AppError;
use crate::templates::detail_url;
use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use tracing::info;

/// Only plain decimal ids address a file; anything else is simply not found.
fn parse_file_id(raw: &str) -> Option<i32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn not_found() -> AppError {
    AppError::NotFound("File not found".to_string())
}

#[utoipa::path(
    get,
    path = "/{file_id}/",
    params(
        ("file_id" = i32, Path, description = "File identifier")
    ),
    responses(
        (status = 200, description = "Rendered file details", body = String, content_type = "text/html"),
        (status = 404, description = "File not found")
    ),
    tag = "files"
)]
pub async fn file_detail(
    State(state): State<crate::AppState>,
    Path(file_id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = parse_file_id(&file_id).ok_or_else(not_found)?;
    let record = state.store.get_by_id(id).await?;

    info!("serving file {}", id);

    Ok(Html(state.renderer.render_detail(&record)?))
}

/// Redirects `/{file_id}` to the canonical `/{file_id}/`.
pub async fn append_slash(Path(file_id): Path<String>) -> Result<Response, AppError> {
    let id = parse_file_id(&file_id).ok_or_else(not_found)?;
    Ok((
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, detail_url(id))],
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_id() {
        assert_eq!(parse_file_id("1"), Some(1));
        assert_eq!(parse_file_id("0042"), Some(42));
        assert_eq!(parse_file_id(""), None);
        assert_eq!(parse_file_id("-1"), None);
        assert_eq!(parse_file_id("+1"), None);
        assert_eq!(parse_file_id("abc"), None);
        assert_eq!(parse_file_id("99999999999"), None);
    }
}
