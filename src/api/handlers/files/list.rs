use crate::api::error::AppError;
use crate::utils::pagination::{FILES_PER_PAGE, PageWindow};
use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::Html,
};
use tracing::info;

use super::types::*;

#[utoipa::path(
    get,
    path = "/",
    params(ListQuery),
    responses(
        (status = 200, description = "Rendered page of uploaded files, newest first", body = String, content_type = "text/html"),
        (status = 500, description = "Database unavailable")
    ),
    tag = "files"
)]
pub async fn list_files(
    State(state): State<crate::AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Html<String>, AppError> {
    // A query string that does not even parse is treated like a missing page.
    let query = query
        .map(|Query(pairs)| ListQuery::from_pairs(pairs))
        .unwrap_or_default();

    let count = usize::try_from(state.store.count().await?).unwrap_or(usize::MAX);
    let window = PageWindow::resolve(count, FILES_PER_PAGE, query.page.as_deref());
    let files = state
        .store
        .list_page(window.offset() as u64, window.per_page as u64)
        .await?;
    let page = window.into_page(files);

    info!("serving page {} with {} files", page.number, page.len());

    Ok(Html(state.renderer.render_index(&page)?))
}
