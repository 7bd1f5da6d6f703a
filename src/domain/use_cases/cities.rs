use validator::Validate;

use crate::entities::city::{City, CityCarousel, CityOverview, CityRegistration, NewCityRequest};
use crate::errors::AppError;
use crate::query::MediaQuery;
use crate::repositories::{city::CityRepository, media::MediaRepository};
use crate::storage::LocalMediaStorage;

pub struct CityHandler<R>
where
    R: CityRepository + MediaRepository,
{
    pub repo: R,
    pub storage: LocalMediaStorage,
}

impl<R> CityHandler<R>
where
    R: CityRepository + MediaRepository,
{
    pub fn new(repo: R, storage: LocalMediaStorage) -> Self {
        CityHandler { repo, storage }
    }

    /// Returns the city for the given identity, creating or reactivating it as needed.
    /// Duplicates are never an error.
    pub async fn register(&self, request: NewCityRequest) -> Result<CityRegistration, AppError> {
        let request = request.normalized();
        request.validate()?;

        if let Some(existing) = self.lookup(&request).await? {
            return self.settle_existing(existing).await;
        }

        match self.repo.create_city(&request.prepare_for_insert()).await {
            Ok(city) => {
                tracing::info!(city_id = city.id, "City registered");
                Ok(CityRegistration {
                    message: format!("City {} registered successfully", city.label()),
                    city,
                    created: true,
                    reactivated: false,
                })
            }
            Err(AppError::Conflict(_)) => {
                // lost the race against a concurrent insert of the same identity
                let existing = self.lookup(&request).await?.ok_or_else(|| {
                    AppError::InternalError("City vanished after identity conflict".to_string())
                })?;
                self.settle_existing(existing).await
            }
            Err(e) => Err(e),
        }
    }

    async fn lookup(&self, request: &NewCityRequest) -> Result<Option<City>, AppError> {
        self.repo
            .find_city_by_identity(&request.name, &request.state, &request.country)
            .await
    }

    async fn settle_existing(&self, city: City) -> Result<CityRegistration, AppError> {
        if city.active {
            return Ok(CityRegistration {
                message: format!("City {} is already registered", city.label()),
                city,
                created: false,
                reactivated: false,
            });
        }

        let city = self.repo.set_city_active(city.id, true).await?;
        tracing::info!(city_id = city.id, "City reactivated");

        Ok(CityRegistration {
            message: format!("City {} reactivated successfully", city.label()),
            city,
            created: false,
            reactivated: true,
        })
    }

    pub async fn list_active(&self) -> Result<Vec<City>, AppError> {
        self.repo.list_active_cities().await
    }

    pub async fn list_active_with_counts(&self) -> Result<Vec<CityOverview>, AppError> {
        self.repo.list_active_cities_with_counts().await
    }

    pub async fn get_active(&self, city_id: i64) -> Result<City, AppError> {
        self.repo
            .get_city_by_id(city_id)
            .await?
            .filter(|city| city.active)
            .ok_or(AppError::CityNotFound(city_id))
    }

    /// Soft delete. Media rows are kept and come back with the city.
    pub async fn deactivate(&self, city_id: i64) -> Result<City, AppError> {
        let city = self.repo.set_city_active(city_id, false).await?;
        tracing::info!(city_id, "City deactivated");
        Ok(city)
    }

    /// Hard delete of the city and every media row it owns.
    pub async fn purge(&self, city_id: i64) -> Result<(), AppError> {
        let file_refs = self.repo.purge_city(city_id).await?;
        tracing::info!(city_id, removed_media = file_refs.len(), "City purged");

        for file_ref in file_refs {
            if let Err(e) = self.storage.remove(&file_ref).await {
                tracing::warn!(city_id, file_ref = %file_ref, "Failed to remove stored file: {}", e);
            }
        }

        Ok(())
    }

    pub async fn carousel(&self, city_id: i64) -> Result<CityCarousel, AppError> {
        let city = self.get_active(city_id).await?;
        let media = self
            .repo
            .find_media(&MediaQuery::for_city(city_id))
            .await?
            .iter()
            .map(|entry| entry.to_response())
            .collect();

        Ok(CityCarousel { city, media })
    }
}
