use crate::config::AppConfig;
use crate::entities::files;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::time::Duration;
use tracing::info;

const IN_MEMORY_KEEP_ALIVE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

pub async fn setup_database(config: &AppConfig) -> anyhow::Result<DatabaseConnection> {
    info!("📂 Database: {}", config.database_url);

    let mut opt = ConnectOptions::new(&config.database_url);
    opt.connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    if is_in_memory_sqlite(&config.database_url) {
        // Every SQLite connection to :memory: opens its own empty database,
        // so the schema and data only exist on a single, never recycled one.
        // Left unset, the pool would fall back to recycling after 10/30 minutes.
        opt.max_connections(1)
            .min_connections(1)
            .idle_timeout(IN_MEMORY_KEEP_ALIVE)
            .max_lifetime(IN_MEMORY_KEEP_ALIVE);
    } else {
        opt.max_connections(20)
            .min_connections(1)
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800));
    }

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;

    Ok(db)
}

pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    info!("🔄 Running auto-migrations...");

    let stmt = schema
        .create_table_from_entity(files::Entity)
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&stmt)).await?;
    info!("   - Table 'files' checked/created");

    db.execute(sea_orm::Statement::from_string(
        builder,
        "CREATE INDEX IF NOT EXISTS idx_files_uploaded_at ON files(uploaded_at)".to_string(),
    ))
    .await?;

    Ok(())
}

fn is_in_memory_sqlite(url: &str) -> bool {
    url.starts_with("sqlite:") && (url.contains(":memory:") || url.contains("mode=memory"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::file_store::{FileRecordStore, SeaOrmFileStore};
    use std::sync::Arc;
    use tokio::task::JoinSet;

    #[test]
    fn test_is_in_memory_sqlite() {
        assert!(is_in_memory_sqlite("sqlite::memory:"));
        assert!(is_in_memory_sqlite("sqlite://file:test?mode=memory&cache=shared"));
        assert!(!is_in_memory_sqlite("sqlite://file_drop.db?mode=rwc"));
        assert!(!is_in_memory_sqlite("postgres://localhost/files"));
    }

    #[tokio::test]
    async fn test_in_memory_database_survives_concurrent_queries() {
        let db = setup_database(&AppConfig::development()).await.unwrap();
        let store = Arc::new(SeaOrmFileStore::new(db));
        store
            .create(chrono::Utc::now(), "uploads/a/a.txt".to_string(), 5)
            .await
            .unwrap();

        let mut tasks = JoinSet::new();
        for _ in 0..16 {
            let store = store.clone();
            tasks.spawn(async move { store.list_newest_first().await });
        }

        while let Some(result) = tasks.join_next().await {
            let records = result.unwrap().unwrap();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].name(), "a.txt");
        }
    }
}
