use async_trait::async_trait;

use crate::{
    entities::backup::{BackupTable, CityRecord, MediaRecord},
    entities::{city::City, media::Media},
    errors::AppError,
    repositories::sqlx_repo::{SqlxGalleryRepo, CITY_COLUMNS},
};

/// Bulk operations used by the import/export jobs.
#[async_trait]
pub trait BackupRepository: Send + Sync {
    /// Removes every row from the table; returns how many were deleted
    async fn clear_table(&self, table: BackupTable) -> Result<u64, AppError>;

    /// Inserts a city keeping its id
    async fn insert_city_record(&self, record: &CityRecord) -> Result<(), AppError>;

    /// Inserts a media row keeping its id
    async fn insert_media_record(&self, record: &MediaRecord) -> Result<(), AppError>;

    /// Moves the id generator past the highest stored id
    async fn sync_id_sequence(&self, table: BackupTable) -> Result<(), AppError>;

    async fn export_cities(&self) -> Result<Vec<CityRecord>, AppError>;

    async fn export_media(&self) -> Result<Vec<MediaRecord>, AppError>;
}

#[async_trait]
impl BackupRepository for SqlxGalleryRepo {
    async fn clear_table(&self, table: BackupTable) -> Result<u64, AppError> {
        // table names come from a closed enum, never from the document
        let result = sqlx::query(&format!("DELETE FROM {}", table.name()))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn insert_city_record(&self, record: &CityRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO cities (id, name, state, country, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#
        )
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.state)
        .bind(&record.country)
        .bind(record.active)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_media_record(&self, record: &MediaRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO media (id, title, description, file_ref, city_id, active, uploaded_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#
        )
        .bind(record.id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.file_ref)
        .bind(record.city_id)
        .bind(record.active)
        .bind(record.uploaded_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn sync_id_sequence(&self, table: BackupTable) -> Result<(), AppError> {
        let name = table.name();
        sqlx::query(&format!(
            "SELECT setval(pg_get_serial_sequence('{name}', 'id'), COALESCE((SELECT MAX(id) FROM {name}), 0) + 1, false)"
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn export_cities(&self) -> Result<Vec<CityRecord>, AppError> {
        let cities = sqlx::query_as::<_, City>(&format!("SELECT {CITY_COLUMNS} FROM cities ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        Ok(cities.into_iter().map(CityRecord::from).collect())
    }

    async fn export_media(&self) -> Result<Vec<MediaRecord>, AppError> {
        let media = sqlx::query_as::<_, Media>(
            "SELECT id, title, description, file_ref, city_id, active, uploaded_at, updated_at FROM media ORDER BY id"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(media.into_iter().map(MediaRecord::from).collect())
    }
}
