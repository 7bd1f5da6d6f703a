use async_trait::async_trait;
use derive_more::From;

use crate::{
    entities::{
        backup::{BackupTable, CityRecord, MediaRecord},
        city::{City, CityInsert, CityOverview},
        media::{Media, MediaEntry, MediaInsert},
    },
    errors::AppError,
    query::MediaQuery,
    repositories::{
        backup::BackupRepository, city::CityRepository, media::MediaRepository,
        memory::InMemoryGalleryRepo, sqlx_repo::SqlxGalleryRepo,
    },
};

/// Combined repository enum for enum dispatch
#[derive(Clone, From)]
pub enum AnyGalleryRepo {
    Postgres(SqlxGalleryRepo),
    Memory(InMemoryGalleryRepo),
}

impl AnyGalleryRepo {
    pub fn backend_name(&self) -> &'static str {
        match self {
            AnyGalleryRepo::Postgres(_) => "postgres",
            AnyGalleryRepo::Memory(_) => "memory",
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $repo:ident => $call:expr) => {
        match $self {
            AnyGalleryRepo::Postgres($repo) => $call,
            AnyGalleryRepo::Memory($repo) => $call,
        }
    };
}

#[async_trait]
impl CityRepository for AnyGalleryRepo {
    async fn check_connection(&self) -> Result<(), AppError> {
        dispatch!(self, r => r.check_connection().await)
    }

    async fn find_city_by_identity(&self, name: &str, state: &str, country: &str) -> Result<Option<City>, AppError> {
        dispatch!(self, r => r.find_city_by_identity(name, state, country).await)
    }

    async fn create_city(&self, city: &CityInsert) -> Result<City, AppError> {
        dispatch!(self, r => r.create_city(city).await)
    }

    async fn set_city_active(&self, id: i64, active: bool) -> Result<City, AppError> {
        dispatch!(self, r => r.set_city_active(id, active).await)
    }

    async fn get_city_by_id(&self, id: i64) -> Result<Option<City>, AppError> {
        dispatch!(self, r => r.get_city_by_id(id).await)
    }

    async fn find_active_city_by_name(&self, name: &str) -> Result<Option<City>, AppError> {
        dispatch!(self, r => r.find_active_city_by_name(name).await)
    }

    async fn list_active_cities(&self) -> Result<Vec<City>, AppError> {
        dispatch!(self, r => r.list_active_cities().await)
    }

    async fn list_active_cities_with_counts(&self) -> Result<Vec<CityOverview>, AppError> {
        dispatch!(self, r => r.list_active_cities_with_counts().await)
    }

    async fn purge_city(&self, id: i64) -> Result<Vec<String>, AppError> {
        dispatch!(self, r => r.purge_city(id).await)
    }
}

#[async_trait]
impl MediaRepository for AnyGalleryRepo {
    async fn create_media(&self, media: &MediaInsert) -> Result<Media, AppError> {
        dispatch!(self, r => r.create_media(media).await)
    }

    async fn get_media_entry(&self, id: i64) -> Result<Option<MediaEntry>, AppError> {
        dispatch!(self, r => r.get_media_entry(id).await)
    }

    async fn find_media(&self, query: &MediaQuery) -> Result<Vec<MediaEntry>, AppError> {
        dispatch!(self, r => r.find_media(query).await)
    }

    async fn count_media(&self) -> Result<i64, AppError> {
        dispatch!(self, r => r.count_media().await)
    }

    async fn delete_media(&self, id: i64) -> Result<Media, AppError> {
        dispatch!(self, r => r.delete_media(id).await)
    }

    async fn update_media_file_ref(&self, id: i64, file_ref: &str) -> Result<(), AppError> {
        dispatch!(self, r => r.update_media_file_ref(id, file_ref).await)
    }
}

#[async_trait]
impl BackupRepository for AnyGalleryRepo {
    async fn clear_table(&self, table: BackupTable) -> Result<u64, AppError> {
        dispatch!(self, r => r.clear_table(table).await)
    }

    async fn insert_city_record(&self, record: &CityRecord) -> Result<(), AppError> {
        dispatch!(self, r => r.insert_city_record(record).await)
    }

    async fn insert_media_record(&self, record: &MediaRecord) -> Result<(), AppError> {
        dispatch!(self, r => r.insert_media_record(record).await)
    }

    async fn sync_id_sequence(&self, table: BackupTable) -> Result<(), AppError> {
        dispatch!(self, r => r.sync_id_sequence(table).await)
    }

    async fn export_cities(&self) -> Result<Vec<CityRecord>, AppError> {
        dispatch!(self, r => r.export_cities().await)
    }

    async fn export_media(&self) -> Result<Vec<MediaRecord>, AppError> {
        dispatch!(self, r => r.export_media().await)
    }
}
