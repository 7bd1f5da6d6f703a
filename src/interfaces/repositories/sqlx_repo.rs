use sqlx::PgPool;

/// Postgres-backed repository for cities, media and backups.
#[derive(Clone)]
pub struct SqlxGalleryRepo {
    pub pool: PgPool,
}

impl SqlxGalleryRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxGalleryRepo { pool }
    }
}

pub(crate) const CITY_COLUMNS: &str =
    "id, name, state, country, active, created_at, updated_at";

pub(crate) const MEDIA_ENTRY_SELECT: &str = r#"
    SELECT m.id, m.title, m.description, m.file_ref, m.city_id, m.active,
           m.uploaded_at, m.updated_at,
           c.name AS city_name, c.state AS city_state, c.country AS city_country
    FROM media m
    JOIN cities c ON c.id = m.city_id
"#;
