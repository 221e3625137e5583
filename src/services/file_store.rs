use crate::api::error::AppError;
use crate::entities::{files, prelude::*};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, NotSet, PaginatorTrait, QueryOrder,
    QuerySelect, Select, Set,
};

/// A persisted upload. Records are created once and never modified.
pub type FileRecord = files::Model;

#[async_trait]
pub trait FileRecordStore: Send + Sync {
    /// Persists a new record and returns it with its assigned id.
    async fn create(
        &self,
        uploaded_at: DateTime<Utc>,
        file: String,
        size: i64,
    ) -> Result<FileRecord, AppError>;

    async fn get_by_id(&self, id: i32) -> Result<FileRecord, AppError>;

    /// All records, newest upload first. Records sharing a timestamp keep
    /// their insertion order.
    async fn list_newest_first(&self) -> Result<Vec<FileRecord>, AppError>;

    async fn count(&self) -> Result<u64, AppError>;

    /// One window of the newest-first listing.
    async fn list_page(&self, offset: u64, limit: u64) -> Result<Vec<FileRecord>, AppError>;
}

pub struct SeaOrmFileStore {
    db: DatabaseConnection,
}

impl SeaOrmFileStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn newest_first() -> Select<Files> {
        Files::find()
            .order_by_desc(files::Column::UploadedAt)
            .order_by_asc(files::Column::Id)
    }
}

#[async_trait]
impl FileRecordStore for SeaOrmFileStore {
    async fn create(
        &self,
        uploaded_at: DateTime<Utc>,
        file: String,
        size: i64,
    ) -> Result<FileRecord, AppError> {
        let record = files::ActiveModel {
            id: NotSet,
            uploaded_at: Set(uploaded_at),
            file: Set(file),
            size: Set(size),
        }
        .insert(&self.db)
        .await?;

        tracing::debug!("Created file record {} for {}", record.id, record.file);
        Ok(record)
    }

    async fn get_by_id(&self, id: i32) -> Result<FileRecord, AppError> {
        Files::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))
    }

    async fn list_newest_first(&self) -> Result<Vec<FileRecord>, AppError> {
        let records = Self::newest_first().all(&self.db).await?;
        Ok(records)
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(Files::find().count(&self.db).await?)
    }

    async fn list_page(&self, offset: u64, limit: u64) -> Result<Vec<FileRecord>, AppError> {
        let records = Self::newest_first()
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(records)
    }
}
