pub mod postgres;

use crate::{
    errors::AppError,
    repositories::{any::AnyGalleryRepo, memory::InMemoryGalleryRepo, sqlx_repo::SqlxGalleryRepo},
    settings::{AppConfig, StorageBackend},
};

/// Opens the repository selected by `storage_backend`, migrating postgres first.
pub async fn open_repository(config: &AppConfig) -> Result<AnyGalleryRepo, AppError> {
    match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = postgres::create_pool(&config.database_url, config.db_max_connections).await?;
            postgres::run_migrations(&pool).await?;
            Ok(SqlxGalleryRepo::new(pool).into())
        }
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory backend; data is lost on shutdown");
            Ok(InMemoryGalleryRepo::new().into())
        }
    }
}
