use crate::config::{AppConfig, StorageBackend};
use crate::services::storage::{LocalStorageService, S3StorageService, StorageService};
use anyhow::{Context, Result};
use aws_sdk_s3::config::Region;
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &AppConfig) -> Result<Arc<dyn StorageService>> {
    match config.storage_backend {
        StorageBackend::Local => {
            tokio::fs::create_dir_all(&config.media_root)
                .await
                .with_context(|| format!("Failed to create media root {:?}", config.media_root))?;
            info!("💾 Local Storage: {:?}", config.media_root);
            Ok(Arc::new(LocalStorageService::new(config.media_root.clone())))
        }
        StorageBackend::S3 => Ok(Arc::new(setup_s3(config).await?)),
    }
}

async fn setup_s3(config: &AppConfig) -> Result<S3StorageService> {
    let endpoint_url = config
        .s3_endpoint
        .clone()
        .context("MINIO_ENDPOINT must be set for the s3 storage backend")?;
    let access_key = config
        .s3_access_key
        .clone()
        .context("MINIO_ACCESS_KEY must be set for the s3 storage backend")?;
    let secret_key = config
        .s3_secret_key
        .clone()
        .context("MINIO_SECRET_KEY must be set for the s3 storage backend")?;
    let bucket = config.s3_bucket.clone();

    info!("☁️  S3 Storage: {} (Bucket: {})", endpoint_url, bucket);

    let aws_config = aws_config::from_env()
        .endpoint_url(&endpoint_url)
        .region(Region::new("us-east-1"))
        .credentials_provider(aws_sdk_s3::config::Credentials::new(
            access_key, secret_key, None, None, "static",
        ))
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(true)
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);

    // Ensure bucket exists
    match s3_client.head_bucket().bucket(&bucket).send().await {
        Ok(_) => info!("✅ Bucket '{}' is ready", bucket),
        Err(_) => {
            info!("🪣 Bucket '{}' not found, creating...", bucket);
            if let Err(e) = s3_client.create_bucket().bucket(&bucket).send().await {
                tracing::error!("❌ Failed to create bucket '{}': {}", bucket, e);
            } else {
                info!("✅ Bucket '{}' created successfully", bucket);
            }
        }
    }

    Ok(S3StorageService::new(s3_client, bucket))
}
