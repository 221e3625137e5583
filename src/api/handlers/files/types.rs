use crate::api::error::AppError;
use crate::services::file_service::UploadedFile;
use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, PartialEq, Eq, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Page number; missing, invalid or out of range values are clamped
    pub page: Option<String>,
}

impl ListQuery {
    /// Builds the query from raw query-string pairs. A repeated `page` keeps
    /// its last value.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let page = pairs
            .into_iter()
            .filter(|(key, _)| key == "page")
            .map(|(_, value)| value)
            .last();
        Self { page }
    }
}

/// Multipart body accepted by `POST /upload`
#[derive(ToSchema)]
pub struct UploadRequest {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Parsed upload form. Only parts named `file` that carry a filename count;
/// when several are sent the last one wins.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
}

impl UploadForm {
    pub async fn from_multipart(multipart: &mut Multipart) -> Result<Self, AppError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            if field.name() != Some("file") {
                continue;
            }

            let Some(filename) = field
                .file_name()
                .filter(|name| !name.is_empty())
                .map(str::to_string)
            else {
                continue;
            };
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await.map_err(multipart_error)?;

            form.file = Some(UploadedFile {
                filename,
                content_type,
                data,
            });
        }

        Ok(form)
    }

    pub fn require_file(self) -> Result<UploadedFile, AppError> {
        self.file
            .ok_or_else(|| AppError::BadRequest("No file provided".to_string()))
    }
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_list_query_keeps_last_page() {
        let query = ListQuery::from_pairs(pairs(&[("page", "1"), ("sort", "x"), ("page", "2")]));
        assert_eq!(query.page.as_deref(), Some("2"));

        assert_eq!(ListQuery::from_pairs(pairs(&[("sort", "x")])), ListQuery::default());
    }
}
