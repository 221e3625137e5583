pub mod detail;
pub mod list;
pub mod media;
pub mod types;
pub mod upload;

// Re-export all types
pub use types::*;

// Re-export all handlers
pub use detail::{append_slash, file_detail};
pub use list::list_files;
pub use media::download_media;
pub use upload::upload_file;
