use std::env;
use std::path::PathBuf;

/// Blob storage backend for uploaded files
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Files live under `media_root` on the local filesystem
    Local,
    /// Files live in an S3-compatible bucket (MinIO in development)
    S3,
}

impl StorageBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "local" | "fs" | "filesystem" => Some(Self::Local),
            "s3" | "minio" => Some(Self::S3),
            _ => None,
        }
    }
}

/// Outbound mail configuration for upload notifications
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Mail transport: "console", "file", "smtp" or "memory" (default: "console")
    pub backend: String,

    /// Sender address (default: "noreply@example.com")
    pub from: String,

    /// Recipient addresses (default: "guest@example.com")
    pub to: Vec<String>,

    /// Directory used by the file transport (default: "./sent_mail")
    pub file_path: PathBuf,

    /// SMTP relay host (default: "127.0.0.1")
    pub smtp_host: String,

    /// SMTP relay port (default: 25)
    pub smtp_port: u16,

    /// Timeout for a whole SMTP conversation in seconds (default: 10)
    pub smtp_timeout_secs: u64,

    /// Log transport failures instead of failing the upload request (default: false)
    pub fail_silently: bool,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            backend: "console".to_string(),
            from: "noreply@example.com".to_string(),
            to: vec!["guest@example.com".to_string()],
            file_path: PathBuf::from("./sent_mail"),
            smtp_host: "127.0.0.1".to_string(),
            smtp_port: 25,
            smtp_timeout_secs: 10,
            fail_silently: false,
        }
    }
}

impl MailConfig {
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            backend: env::var("MAIL_BACKEND").unwrap_or(default.backend),
            from: env::var("MAIL_FROM").unwrap_or(default.from),
            to: env::var("MAIL_TO")
                .ok()
                .map(|v| split_list(&v))
                .filter(|list| !list.is_empty())
                .unwrap_or(default.to),
            file_path: env::var("MAIL_FILE_PATH")
                .map(PathBuf::from)
                .unwrap_or(default.file_path),
            smtp_host: env::var("SMTP_HOST").unwrap_or(default.smtp_host),
            smtp_port: env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.smtp_port),
            smtp_timeout_secs: env::var("SMTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.smtp_timeout_secs),
            fail_silently: env::var("MAIL_FAIL_SILENTLY")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(default.fail_silently),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Database connection string (default: "sqlite://file_drop.db?mode=rwc")
    pub database_url: String,

    /// Where uploaded bytes are stored (default: local)
    pub storage_backend: StorageBackend,

    /// Root directory for the local storage backend (default: "./media")
    pub media_root: PathBuf,

    /// S3 endpoint, credentials and bucket, only read for the s3 backend
    pub s3_endpoint: Option<String>,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,
    pub s3_bucket: String,

    /// Maximum upload size in bytes (default: 64 MB)
    pub max_file_size: usize,

    pub mail: MailConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://file_drop.db?mode=rwc".to_string(),
            storage_backend: StorageBackend::Local,
            media_root: PathBuf::from("./media"),
            s3_endpoint: None,
            s3_access_key: None,
            s3_secret_key: None,
            s3_bucket: "uploads".to_string(),
            max_file_size: 64 * 1024 * 1024, // 64 MB
            mail: MailConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => StorageBackend::parse(&value).unwrap_or_else(|| {
                tracing::warn!("Unknown storage backend '{}', using local storage", value);
                StorageBackend::Local
            }),
            Err(_) => default.storage_backend,
        };

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(default.database_url),
            storage_backend,
            media_root: env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(default.media_root),
            s3_endpoint: env::var("MINIO_ENDPOINT").ok(),
            s3_access_key: env::var("MINIO_ACCESS_KEY").ok(),
            s3_secret_key: env::var("MINIO_SECRET_KEY").ok(),
            s3_bucket: env::var("MINIO_BUCKET").unwrap_or(default.s3_bucket),
            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),
            mail: MailConfig::from_env(),
        }
    }

    /// Create config for development and tests (in-memory database, in-memory outbox)
    pub fn development() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            mail: MailConfig {
                backend: "memory".to_string(),
                ..MailConfig::default()
            },
            ..Self::default()
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.storage_backend, StorageBackend::Local);
        assert_eq!(config.max_file_size, 64 * 1024 * 1024);
        assert_eq!(config.mail.backend, "console");
        assert_eq!(config.mail.from, "noreply@example.com");
        assert_eq!(config.mail.to, vec!["guest@example.com".to_string()]);
        assert!(!config.mail.fail_silently);
    }

    #[test]
    fn test_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.mail.backend, "memory");
    }

    #[test]
    fn test_storage_backend_parse() {
        assert_eq!(StorageBackend::parse("S3"), Some(StorageBackend::S3));
        assert_eq!(StorageBackend::parse("minio"), Some(StorageBackend::S3));
        assert_eq!(StorageBackend::parse(" local "), Some(StorageBackend::Local));
        assert_eq!(StorageBackend::parse("ftp"), None);
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list("a@example.com, b@example.com,,"),
            vec!["a@example.com".to_string(), "b@example.com".to_string()]
        );
        assert!(split_list(" , ").is_empty());
    }
}
