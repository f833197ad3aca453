// Shared helpers for integration tests
use schoolhub_db::sea_orm::DatabaseConnection;
use schoolhub_db::DatabaseConfig;
use schoolhub_migration::{Migrator, MigratorTrait};

/// In-memory SQLite with the full schema applied.
pub async fn migrated_db() -> DatabaseConnection {
    let db = bare_db().await;
    Migrator::up(&db, None).await.unwrap();
    db
}

/// In-memory SQLite with no tables; every query against it fails.
pub async fn bare_db() -> DatabaseConnection {
    schoolhub_db::connect(&DatabaseConfig::in_memory())
        .await
        .unwrap()
}
