use std::borrow::Cow;

use async_trait::async_trait;

use crate::{
    entities::city::{City, CityInsert, CityOverview},
    errors::AppError,
    repositories::sqlx_repo::{SqlxGalleryRepo, CITY_COLUMNS},
};

#[async_trait]
pub trait CityRepository: Send + Sync {
    /// Verifies the backend is reachable
    async fn check_connection(&self) -> Result<(), AppError>;

    /// Case-insensitive lookup on (name, state, country), active or not
    async fn find_city_by_identity(&self, name: &str, state: &str, country: &str) -> Result<Option<City>, AppError>;

    /// Inserts a city; `Conflict` when the identity is already taken
    async fn create_city(&self, city: &CityInsert) -> Result<City, AppError>;

    async fn set_city_active(&self, id: i64, active: bool) -> Result<City, AppError>;

    async fn get_city_by_id(&self, id: i64) -> Result<Option<City>, AppError>;

    /// Exact, case-insensitive match on the name of an active city
    async fn find_active_city_by_name(&self, name: &str) -> Result<Option<City>, AppError>;

    /// Active cities sorted by name
    async fn list_active_cities(&self) -> Result<Vec<City>, AppError>;

    /// Active cities sorted by name, with their active media count
    async fn list_active_cities_with_counts(&self) -> Result<Vec<CityOverview>, AppError>;

    /// Deletes the city and its media in one unit; returns the removed media file references
    async fn purge_city(&self, id: i64) -> Result<Vec<String>, AppError>;
}

#[async_trait]
impl CityRepository for SqlxGalleryRepo {
    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }

    async fn find_city_by_identity(&self, name: &str, state: &str, country: &str) -> Result<Option<City>, AppError> {
        let city = sqlx::query_as::<_, City>(&format!(
            r#"
            SELECT {CITY_COLUMNS} FROM cities
            WHERE lower(name) = lower($1)
              AND lower(state) = lower($2)
              AND lower(country) = lower($3)
            "#
        ))
        .bind(name)
        .bind(state)
        .bind(country)
        .fetch_optional(&self.pool)
        .await?;

        Ok(city)
    }

    async fn create_city(&self, city: &CityInsert) -> Result<City, AppError> {
        sqlx::query_as::<_, City>(&format!(
            r#"
            INSERT INTO cities (name, state, country, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CITY_COLUMNS}
            "#
        ))
        .bind(&city.name)
        .bind(&city.state)
        .bind(&city.country)
        .bind(city.active)
        .bind(city.created_at)
        .bind(city.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.code() == Some(Cow::Borrowed("23505")) => {
                AppError::Conflict("City already exists".to_string())
            }
            _ => AppError::from(e),
        })
    }

    async fn set_city_active(&self, id: i64, active: bool) -> Result<City, AppError> {
        sqlx::query_as::<_, City>(&format!(
            r#"
            UPDATE cities SET active = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {CITY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::CityNotFound(id))
    }

    async fn get_city_by_id(&self, id: i64) -> Result<Option<City>, AppError> {
        sqlx::query_as::<_, City>(&format!("SELECT {CITY_COLUMNS} FROM cities WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn find_active_city_by_name(&self, name: &str) -> Result<Option<City>, AppError> {
        // Identity is (name, state, country), so a bare name can match several rows
        let city = sqlx::query_as::<_, City>(&format!(
            r#"
            SELECT {CITY_COLUMNS} FROM cities
            WHERE lower(name) = lower($1) AND active = TRUE
            ORDER BY id
            LIMIT 1
            "#
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(city)
    }

    async fn list_active_cities(&self) -> Result<Vec<City>, AppError> {
        let cities = sqlx::query_as::<_, City>(&format!(
            "SELECT {CITY_COLUMNS} FROM cities WHERE active = TRUE ORDER BY lower(name) ASC, name ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(cities)
    }

    async fn list_active_cities_with_counts(&self) -> Result<Vec<CityOverview>, AppError> {
        let cities = sqlx::query_as::<_, CityOverview>(
            r#"
            SELECT c.id, c.name, c.state, c.country, c.active, c.created_at, c.updated_at,
                   COUNT(m.id) FILTER (WHERE m.active) AS media_count
            FROM cities c
            LEFT JOIN media m ON m.city_id = c.id
            WHERE c.active = TRUE
            GROUP BY c.id
            ORDER BY lower(c.name) ASC, c.name ASC, c.id ASC
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(cities)
    }

    async fn purge_city(&self, id: i64) -> Result<Vec<String>, AppError> {
        let mut tx = self.pool.begin().await?;

        let file_refs: Vec<String> = sqlx::query_scalar("SELECT file_ref FROM media WHERE city_id = $1")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        // media rows go with the city through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM cities WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::CityNotFound(id));
        }

        tx.commit().await?;
        Ok(file_refs)
    }
}
