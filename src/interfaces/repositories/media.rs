use std::borrow::Cow;

use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use crate::{
    entities::media::{Media, MediaEntry, MediaInsert},
    errors::AppError,
    query::{MediaOrder, MediaQuery},
    repositories::sqlx_repo::{SqlxGalleryRepo, MEDIA_ENTRY_SELECT},
};

const MEDIA_COLUMNS: &str =
    "id, title, description, file_ref, city_id, active, uploaded_at, updated_at";

#[async_trait]
pub trait MediaRepository: Send + Sync {
    /// Inserts a media row; `CityNotFound` when the city does not exist
    async fn create_media(&self, media: &MediaInsert) -> Result<Media, AppError>;

    async fn get_media_entry(&self, id: i64) -> Result<Option<MediaEntry>, AppError>;

    /// Runs a query specification
    async fn find_media(&self, query: &MediaQuery) -> Result<Vec<MediaEntry>, AppError>;

    /// Counts every media row, active or not
    async fn count_media(&self) -> Result<i64, AppError>;

    /// Permanently deletes a media row and returns it
    async fn delete_media(&self, id: i64) -> Result<Media, AppError>;

    async fn update_media_file_ref(&self, id: i64, file_ref: &str) -> Result<(), AppError>;
}

/// Appends the WHERE / ORDER BY / LIMIT clauses for a query specification.
pub(crate) fn push_media_query(builder: &mut QueryBuilder<'_, Postgres>, query: &MediaQuery) {
    let filter = &query.filter;

    builder.push(" WHERE TRUE");

    if filter.active_only {
        builder.push(" AND m.active = TRUE");
    }
    if let Some(city_id) = filter.city_id {
        builder.push(" AND m.city_id = ").push_bind(city_id);
    }
    if let Some(exclude_id) = filter.exclude_id {
        builder.push(" AND m.id <> ").push_bind(exclude_id);
    }
    if let Some(keyword) = &filter.keyword {
        let pattern = keyword.like_pattern();
        builder.push(" AND (c.name ILIKE ").push_bind(pattern.clone());
        builder.push(" OR m.title ILIKE ").push_bind(pattern.clone());
        builder.push(" OR m.description ILIKE ").push_bind(pattern);
        builder.push(")");
    }

    match query.order {
        MediaOrder::NewestFirst => builder.push(" ORDER BY m.uploaded_at DESC, m.id DESC"),
    };

    if let Some(limit) = query.limit {
        builder.push(" LIMIT ").push_bind(limit as i64);
    }
}

#[async_trait]
impl MediaRepository for SqlxGalleryRepo {
    async fn create_media(&self, media: &MediaInsert) -> Result<Media, AppError> {
        sqlx::query_as::<_, Media>(&format!(
            r#"
            INSERT INTO media (title, description, file_ref, city_id, active, uploaded_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {MEDIA_COLUMNS}
            "#
        ))
        .bind(&media.title)
        .bind(&media.description)
        .bind(&media.file_ref)
        .bind(media.city_id)
        .bind(media.active)
        .bind(media.uploaded_at)
        .bind(media.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.code() == Some(Cow::Borrowed("23503")) => {
                AppError::CityNotFound(media.city_id)
            }
            _ => AppError::from(e),
        })
    }

    async fn get_media_entry(&self, id: i64) -> Result<Option<MediaEntry>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(MEDIA_ENTRY_SELECT);
        builder.push(" WHERE m.id = ").push_bind(id);

        let entry = builder
            .build_query_as::<MediaEntry>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    async fn find_media(&self, query: &MediaQuery) -> Result<Vec<MediaEntry>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(MEDIA_ENTRY_SELECT);
        push_media_query(&mut builder, query);

        let entries = builder
            .build_query_as::<MediaEntry>()
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    async fn count_media(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM media")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn delete_media(&self, id: i64) -> Result<Media, AppError> {
        sqlx::query_as::<_, Media>(&format!(
            "DELETE FROM media WHERE id = $1 RETURNING {MEDIA_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::MediaNotFound(id))
    }

    async fn update_media_file_ref(&self, id: i64, file_ref: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE media SET file_ref = $2, updated_at = NOW() WHERE id = $1"
        )
        .bind(id)
        .bind(file_ref)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::MediaNotFound(id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Keyword;

    fn sql_for(query: &MediaQuery) -> String {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM media m JOIN cities c ON c.id = m.city_id");
        push_media_query(&mut builder, query);
        builder.sql().to_string()
    }

    #[test]
    fn search_without_keyword_only_filters_active() {
        let sql = sql_for(&MediaQuery::search(None));

        assert!(sql.contains("m.active = TRUE"));
        assert!(!sql.contains("ILIKE"));
        assert!(sql.ends_with("ORDER BY m.uploaded_at DESC, m.id DESC"));
    }

    #[test]
    fn keyword_search_ors_three_columns() {
        let sql = sql_for(&MediaQuery::search(Keyword::parse(Some("porto"))));

        assert!(sql.contains("(c.name ILIKE $1 OR m.title ILIKE $2 OR m.description ILIKE $3)"));
    }

    #[test]
    fn related_query_binds_city_exclusion_and_limit() {
        let sql = sql_for(&MediaQuery::related(4, 7, 6));

        assert!(sql.contains("m.city_id = $1"));
        assert!(sql.contains("m.id <> $2"));
        assert!(sql.ends_with("LIMIT $3"));
    }
}
