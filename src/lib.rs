pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod templates;
pub mod utils;

use crate::api::handlers;
use crate::config::AppConfig;
use crate::services::file_service::FileService;
use crate::services::file_store::FileRecordStore;
use crate::services::mailer::Mailer;
use crate::services::storage::StorageService;
use crate::templates::PageRenderer;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::files::list::list_files,
        handlers::files::detail::file_detail,
        handlers::files::upload::upload_file,
        handlers::files::media::download_media,
        handlers::health::health_check,
    ),
    components(
        schemas(
            handlers::files::UploadRequest,
        )
    ),
    tags(
        (name = "files", description = "Upload, browse and download files"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FileRecordStore>,
    pub storage: Arc<dyn StorageService>,
    pub renderer: Arc<dyn PageRenderer>,
    pub file_service: Arc<FileService>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(
        store: Arc<dyn FileRecordStore>,
        storage: Arc<dyn StorageService>,
        mailer: Arc<dyn Mailer>,
        renderer: Arc<dyn PageRenderer>,
        config: AppConfig,
    ) -> Self {
        let file_service = Arc::new(FileService::new(
            store.clone(),
            storage.clone(),
            mailer,
            config.mail.clone(),
        ));

        Self {
            store,
            storage,
            renderer,
            file_service,
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_file_size);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(handlers::files::list_files))
        .route("/health", get(handlers::health::health_check))
        .route("/upload", post(handlers::files::upload_file).layer(body_limit))
        .route("/media/*key", get(handlers::files::download_media))
        .route("/:file_id/", get(handlers::files::file_detail))
        .route("/:file_id", get(handlers::files::append_slash))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .with_state(state)
}
