use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::{
    entities::{
        backup::{BackupTable, CityRecord, MediaRecord},
        city::{City, CityInsert, CityOverview},
        media::{Media, MediaEntry, MediaInsert},
    },
    errors::AppError,
    query::MediaQuery,
    repositories::{backup::BackupRepository, city::CityRepository, media::MediaRepository},
};

#[derive(Debug, Default)]
struct GalleryTables {
    cities: BTreeMap<i64, City>,
    media: BTreeMap<i64, Media>,
    last_city_id: i64,
    last_media_id: i64,
}

impl GalleryTables {
    fn entry(&self, media: &Media) -> Option<MediaEntry> {
        self.cities.get(&media.city_id).map(|city| MediaEntry {
            media: media.clone(),
            city_name: city.name.clone(),
            city_state: city.state.clone(),
            city_country: city.country.clone(),
        })
    }

    fn identity_taken(&self, name: &str, state: &str, country: &str, except: Option<i64>) -> bool {
        self.cities
            .values()
            .any(|c| Some(c.id) != except && c.has_identity(name, state, country))
    }
}

/// Process-local repository used for development and tests.
///
/// Every operation takes the lock once, so a purge removes a city and its media
/// atomically.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGalleryRepo {
    tables: Arc<RwLock<GalleryTables>>,
}

impl InMemoryGalleryRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CityRepository for InMemoryGalleryRepo {
    async fn check_connection(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn find_city_by_identity(&self, name: &str, state: &str, country: &str) -> Result<Option<City>, AppError> {
        let tables = self.tables.read();
        Ok(tables
            .cities
            .values()
            .find(|c| c.has_identity(name, state, country))
            .cloned())
    }

    async fn create_city(&self, city: &CityInsert) -> Result<City, AppError> {
        let mut tables = self.tables.write();
        if tables.identity_taken(&city.name, &city.state, &city.country, None) {
            return Err(AppError::Conflict("City already exists".to_string()));
        }

        tables.last_city_id += 1;
        let created = City {
            id: tables.last_city_id,
            name: city.name.clone(),
            state: city.state.clone(),
            country: city.country.clone(),
            active: city.active,
            created_at: city.created_at,
            updated_at: city.updated_at,
        };
        tables.cities.insert(created.id, created.clone());

        Ok(created)
    }

    async fn set_city_active(&self, id: i64, active: bool) -> Result<City, AppError> {
        let mut tables = self.tables.write();
        let city = tables.cities.get_mut(&id).ok_or(AppError::CityNotFound(id))?;
        city.active = active;
        city.updated_at = Utc::now();
        Ok(city.clone())
    }

    async fn get_city_by_id(&self, id: i64) -> Result<Option<City>, AppError> {
        Ok(self.tables.read().cities.get(&id).cloned())
    }

    async fn find_active_city_by_name(&self, name: &str) -> Result<Option<City>, AppError> {
        let name = name.to_lowercase();
        Ok(self
            .tables
            .read()
            .cities
            .values()
            .find(|c| c.active && c.name.to_lowercase() == name)
            .cloned())
    }

    async fn list_active_cities(&self) -> Result<Vec<City>, AppError> {
        let mut cities: Vec<City> = self
            .tables
            .read()
            .cities
            .values()
            .filter(|c| c.active)
            .cloned()
            .collect();
        cities.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
                .then(a.id.cmp(&b.id))
        });
        Ok(cities)
    }

    async fn list_active_cities_with_counts(&self) -> Result<Vec<CityOverview>, AppError> {
        let cities = self.list_active_cities().await?;
        let tables = self.tables.read();

        Ok(cities
            .into_iter()
            .map(|city| {
                let media_count = tables
                    .media
                    .values()
                    .filter(|m| m.city_id == city.id && m.active)
                    .count() as i64;
                CityOverview { city, media_count }
            })
            .collect())
    }

    async fn purge_city(&self, id: i64) -> Result<Vec<String>, AppError> {
        let mut tables = self.tables.write();
        if tables.cities.remove(&id).is_none() {
            return Err(AppError::CityNotFound(id));
        }

        let doomed: Vec<i64> = tables
            .media
            .values()
            .filter(|m| m.city_id == id)
            .map(|m| m.id)
            .collect();

        Ok(doomed
            .into_iter()
            .filter_map(|media_id| tables.media.remove(&media_id))
            .map(|m| m.file_ref)
            .collect())
    }
}

#[async_trait]
impl MediaRepository for InMemoryGalleryRepo {
    async fn create_media(&self, media: &MediaInsert) -> Result<Media, AppError> {
        let mut tables = self.tables.write();
        if !tables.cities.contains_key(&media.city_id) {
            return Err(AppError::CityNotFound(media.city_id));
        }

        tables.last_media_id += 1;
        let created = Media {
            id: tables.last_media_id,
            title: media.title.clone(),
            description: media.description.clone(),
            file_ref: media.file_ref.clone(),
            city_id: media.city_id,
            active: media.active,
            uploaded_at: media.uploaded_at,
            updated_at: media.updated_at,
        };
        tables.media.insert(created.id, created.clone());

        Ok(created)
    }

    async fn get_media_entry(&self, id: i64) -> Result<Option<MediaEntry>, AppError> {
        let tables = self.tables.read();
        Ok(tables.media.get(&id).and_then(|m| tables.entry(m)))
    }

    async fn find_media(&self, query: &MediaQuery) -> Result<Vec<MediaEntry>, AppError> {
        let entries = {
            let tables = self.tables.read();
            tables
                .media
                .values()
                .filter_map(|m| tables.entry(m))
                .filter(|e| query.matches(e))
                .collect()
        };

        Ok(query.arrange(entries))
    }

    async fn count_media(&self) -> Result<i64, AppError> {
        Ok(self.tables.read().media.len() as i64)
    }

    async fn delete_media(&self, id: i64) -> Result<Media, AppError> {
        self.tables
            .write()
            .media
            .remove(&id)
            .ok_or(AppError::MediaNotFound(id))
    }

    async fn update_media_file_ref(&self, id: i64, file_ref: &str) -> Result<(), AppError> {
        let mut tables = self.tables.write();
        let media = tables.media.get_mut(&id).ok_or(AppError::MediaNotFound(id))?;
        media.file_ref = file_ref.to_string();
        media.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl BackupRepository for InMemoryGalleryRepo {
    async fn clear_table(&self, table: BackupTable) -> Result<u64, AppError> {
        let mut tables = self.tables.write();
        let removed = match table {
            BackupTable::Cities => {
                // cascade, like the foreign key does in postgres
                let removed = tables.cities.len();
                tables.cities.clear();
                tables.media.clear();
                removed
            }
            BackupTable::Media => {
                let removed = tables.media.len();
                tables.media.clear();
                removed
            }
        };
        Ok(removed as u64)
    }

    async fn insert_city_record(&self, record: &CityRecord) -> Result<(), AppError> {
        let mut tables = self.tables.write();
        if tables.cities.contains_key(&record.id) {
            return Err(AppError::Conflict(format!("City id {} already exists", record.id)));
        }
        if tables.identity_taken(&record.name, &record.state, &record.country, Some(record.id)) {
            return Err(AppError::Conflict("City already exists".to_string()));
        }
        tables.cities.insert(record.id, City::from(record.clone()));
        Ok(())
    }

    async fn insert_media_record(&self, record: &MediaRecord) -> Result<(), AppError> {
        let mut tables = self.tables.write();
        if !tables.cities.contains_key(&record.city_id) {
            return Err(AppError::CityNotFound(record.city_id));
        }
        if tables.media.contains_key(&record.id) {
            return Err(AppError::Conflict(format!("Media id {} already exists", record.id)));
        }
        tables.media.insert(record.id, Media::from(record.clone()));
        Ok(())
    }

    async fn sync_id_sequence(&self, table: BackupTable) -> Result<(), AppError> {
        let mut tables = self.tables.write();
        match table {
            BackupTable::Cities => {
                tables.last_city_id = tables.cities.keys().max().copied().unwrap_or(0);
            }
            BackupTable::Media => {
                tables.last_media_id = tables.media.keys().max().copied().unwrap_or(0);
            }
        }
        Ok(())
    }

    async fn export_cities(&self) -> Result<Vec<CityRecord>, AppError> {
        Ok(self
            .tables
            .read()
            .cities
            .values()
            .cloned()
            .map(CityRecord::from)
            .collect())
    }

    async fn export_media(&self) -> Result<Vec<MediaRecord>, AppError> {
        Ok(self
            .tables
            .read()
            .media
            .values()
            .cloned()
            .map(MediaRecord::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::city::NewCityRequest;

    async fn seed_city(repo: &InMemoryGalleryRepo, name: &str) -> City {
        repo.create_city(&NewCityRequest::new(name, "Norte", "Portugal").prepare_for_insert())
            .await
            .unwrap()
    }

    fn media_for(city_id: i64, title: &str) -> MediaInsert {
        let now = Utc::now();
        MediaInsert {
            title: title.into(),
            description: "desc".into(),
            file_ref: format!("{title}.jpg"),
            city_id,
            active: true,
            uploaded_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn duplicate_identity_conflicts() {
        let repo = InMemoryGalleryRepo::new();
        seed_city(&repo, "Porto").await;

        let again = repo
            .create_city(&NewCityRequest::new("PORTO", "norte", "PORTUGAL").prepare_for_insert())
            .await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn media_requires_existing_city() {
        let repo = InMemoryGalleryRepo::new();
        let err = repo.create_media(&media_for(42, "orphan")).await.unwrap_err();
        assert!(matches!(err, AppError::CityNotFound(42)));
    }

    #[tokio::test]
    async fn purge_removes_city_media_only() {
        let repo = InMemoryGalleryRepo::new();
        let porto = seed_city(&repo, "Porto").await;
        let braga = seed_city(&repo, "Braga").await;
        repo.create_media(&media_for(porto.id, "ribeira")).await.unwrap();
        let kept = repo.create_media(&media_for(braga.id, "bom-jesus")).await.unwrap();

        let removed = repo.purge_city(porto.id).await.unwrap();

        assert_eq!(removed, vec!["ribeira.jpg".to_string()]);
        assert_eq!(repo.count_media().await.unwrap(), 1);
        assert!(repo.get_media_entry(kept.id).await.unwrap().is_some());
        assert!(matches!(repo.purge_city(porto.id).await, Err(AppError::CityNotFound(_))));
    }

    #[tokio::test]
    async fn active_cities_sort_by_name_ignoring_case() {
        let repo = InMemoryGalleryRepo::new();
        seed_city(&repo, "Zurich").await;
        seed_city(&repo, "amsterdam").await;
        seed_city(&repo, "Braga").await;

        let names: Vec<_> = repo
            .list_active_cities()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["amsterdam", "Braga", "Zurich"]);
    }

    #[tokio::test]
    async fn counts_only_active_media() {
        let repo = InMemoryGalleryRepo::new();
        let porto = seed_city(&repo, "Porto").await;
        repo.create_media(&media_for(porto.id, "a")).await.unwrap();
        let mut hidden = media_for(porto.id, "b");
        hidden.active = false;
        repo.create_media(&hidden).await.unwrap();

        let overview = repo.list_active_cities_with_counts().await.unwrap();
        assert_eq!(overview[0].media_count, 1);
    }
}
