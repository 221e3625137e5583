use crate::api::error::AppError;
use crate::config::MailConfig;
use crate::services::file_store::{FileRecord, FileRecordStore};
use crate::services::mailer::{EmailMessage, Mailer};
use crate::services::storage::StorageService;
use crate::utils::validation::{sanitize_filename, storage_key_for};
use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;

/// A file part taken from an upload form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Builds the notification sent after every successful upload.
pub fn upload_notification(name: &str, size: i64, config: &MailConfig) -> EmailMessage {
    EmailMessage::new(
        "New upload.",
        format!("File {} with size {} has been uploaded.", name, size),
        config.from.clone(),
        config.to.clone(),
    )
}

pub struct FileService {
    store: Arc<dyn FileRecordStore>,
    storage: Arc<dyn StorageService>,
    mailer: Arc<dyn Mailer>,
    mail: MailConfig,
}

impl FileService {
    pub fn new(
        store: Arc<dyn FileRecordStore>,
        storage: Arc<dyn StorageService>,
        mailer: Arc<dyn Mailer>,
        mail: MailConfig,
    ) -> Self {
        Self {
            store,
            storage,
            mailer,
            mail,
        }
    }

    /// Stores the blob, records it and notifies the configured recipients.
    ///
    /// The record is committed before the notification is attempted; a failed
    /// send is returned as [`AppError::Notification`] without removing the
    /// record, unless the mail config asks for silent failures.
    pub async fn upload(&self, upload: UploadedFile) -> Result<FileRecord, AppError> {
        let name = sanitize_filename(&upload.filename)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        let size = upload.size() as i64;
        let key = storage_key_for(&name);

        tracing::debug!(
            "Storing upload {} ({} bytes, {:?}) at {}",
            name,
            size,
            upload.content_type,
            key
        );

        self.storage
            .save(&key, upload.data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to store {}: {}", key, e)))?;

        let record = match self.store.create(Utc::now(), key.clone(), size).await {
            Ok(record) => record,
            Err(e) => {
                self.discard_blob(&key).await;
                return Err(e);
            }
        };

        self.notify_upload(&name, size).await?;

        tracing::info!("uploaded file {}", name);
        Ok(record)
    }

    /// Removes a blob whose record could not be written.
    async fn discard_blob(&self, key: &str) {
        if let Err(e) = self.storage.delete(key).await {
            tracing::warn!("Orphaned blob {} left in storage: {}", key, e);
        }
    }

    async fn notify_upload(&self, name: &str, size: i64) -> Result<(), AppError> {
        let message = upload_notification(name, size, &self.mail);

        match self.mailer.send(&message).await {
            Ok(()) => Ok(()),
            Err(e) if self.mail.fail_silently => {
                tracing::warn!("Upload notification for {} failed: {}", name, e);
                Ok(())
            }
            Err(e) => Err(AppError::Notification(e.to_string())),
        }
    }
}
