use validator::Validate;

use crate::entities::media::{Media, MediaCreatedResponse, MediaDetail, MediaEntry, MediaUpload, NewMediaForm};
use crate::errors::{AppError, UploadError};
use crate::query::{MediaQuery, RELATED_MEDIA_LIMIT};
use crate::repositories::{city::CityRepository, media::MediaRepository};
use crate::storage::LocalMediaStorage;
use crate::upload::{ClassifiedFile, MediaValidator};

pub struct MediaHandler<R>
where
    R: CityRepository + MediaRepository,
{
    pub repo: R,
    pub storage: LocalMediaStorage,
    pub validator: MediaValidator,
}

impl<R> MediaHandler<R>
where
    R: CityRepository + MediaRepository,
{
    pub fn new(repo: R, storage: LocalMediaStorage, validator: MediaValidator) -> Self {
        MediaHandler {
            repo,
            storage,
            validator,
        }
    }

    /// Validates a multipart upload and stores it.
    pub async fn upload(&self, upload: MediaUpload) -> Result<MediaCreatedResponse, AppError> {
        let file_name = upload
            .file
            .file_name
            .clone()
            .ok_or(UploadError::MissingFileName)?;
        let declared = upload.file.content_type.as_ref().map(|m| m.essence_str().to_string());
        let payload = tokio::fs::read(upload.file.file.path()).await?;

        let classified = self
            .validator
            .validate(payload, &file_name, declared.as_deref())?;

        let media = self.create(upload.form(), classified).await?;
        let media_type = media.media_type();

        Ok(MediaCreatedResponse {
            id: media.id,
            media_type,
            file_ref: media.file_ref,
            message: format!("The {} was uploaded successfully", media_type),
        })
    }

    /// Writes the file to storage and records it. Stored bytes are removed again
    /// when the row cannot be inserted.
    pub async fn create(&self, form: NewMediaForm, file: ClassifiedFile) -> Result<Media, AppError> {
        let form = form.normalized();
        form.validate()?;

        if self.repo.get_city_by_id(form.city_id).await?.is_none() {
            return Err(AppError::CityNotFound(form.city_id));
        }

        let file_ref = self.storage.store(&file).await?;

        match self.repo.create_media(&form.prepare_for_insert(file_ref.clone())).await {
            Ok(media) => {
                tracing::info!(
                    media_id = media.id,
                    city_id = media.city_id,
                    media_type = %file.media_type,
                    size = file.size(),
                    "Media stored"
                );
                Ok(media)
            }
            Err(e) => {
                if let Err(io_err) = self.storage.remove(&file_ref).await {
                    tracing::warn!(file_ref = %file_ref, "Failed to remove orphaned file: {}", io_err);
                }
                Err(e)
            }
        }
    }

    /// Permanent delete. The stored file goes best-effort.
    pub async fn delete(&self, media_id: i64) -> Result<(), AppError> {
        let media = self.repo.delete_media(media_id).await?;

        if let Err(e) = self.storage.remove(&media.file_ref).await {
            tracing::warn!(media_id, file_ref = %media.file_ref, "Failed to remove stored file: {}", e);
        }

        tracing::info!(media_id, "Media deleted");
        Ok(())
    }

    pub async fn get(&self, media_id: i64, require_active: bool) -> Result<MediaEntry, AppError> {
        self.repo
            .get_media_entry(media_id)
            .await?
            .filter(|entry| !require_active || entry.media.active)
            .ok_or(AppError::MediaNotFound(media_id))
    }

    pub async fn list_related(
        &self,
        city_id: i64,
        exclude_media_id: i64,
        limit: u32,
    ) -> Result<Vec<MediaEntry>, AppError> {
        self.repo
            .find_media(&MediaQuery::related(city_id, exclude_media_id, limit))
            .await
    }

    pub async fn detail(&self, media_id: i64) -> Result<MediaDetail, AppError> {
        let entry = self.get(media_id, true).await?;
        let related = self
            .list_related(entry.media.city_id, entry.media.id, RELATED_MEDIA_LIMIT)
            .await?;

        Ok(MediaDetail {
            media: entry.to_response(),
            related: related.iter().map(MediaEntry::to_response).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::city::NewCityRequest;
    use crate::entities::media::MediaType;
    use crate::repositories::memory::InMemoryGalleryRepo;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        handler: MediaHandler<InMemoryGalleryRepo>,
        city_id: i64,
    }

    async fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let repo = InMemoryGalleryRepo::new();
        let city = repo
            .create_city(&NewCityRequest::new("Porto", "Norte", "Portugal").prepare_for_insert())
            .await
            .unwrap();
        let handler = MediaHandler::new(repo, LocalMediaStorage::new(dir.path()), MediaValidator::default());

        Fixture {
            _dir: dir,
            handler,
            city_id: city.id,
        }
    }

    fn form(title: &str, city_id: i64) -> NewMediaForm {
        NewMediaForm {
            title: title.into(),
            description: "Douro river at dusk".into(),
            city_id,
        }
    }

    fn photo(fx: &Fixture) -> ClassifiedFile {
        fx.handler
            .validator
            .validate(b"jpeg bytes".to_vec(), "ribeira.jpg", Some("image/jpeg"))
            .unwrap()
    }

    #[tokio::test]
    async fn create_stores_file_and_row() {
        let fx = fixture().await;

        let media = fx.handler.create(form("Ribeira", fx.city_id), photo(&fx)).await.unwrap();

        assert_eq!(media.media_type(), MediaType::Photo);
        assert!(fx.handler.storage.resolve(&media.file_ref).await.is_some());
        let entry = fx.handler.get(media.id, true).await.unwrap();
        assert_eq!(entry.city_name, "Porto");
    }

    #[tokio::test]
    async fn create_for_missing_city_writes_nothing() {
        let fx = fixture().await;

        let result = fx.handler.create(form("Ribeira", 99), photo(&fx)).await;

        assert!(matches!(result, Err(AppError::CityNotFound(99))));
        assert!(std::fs::read_dir(fx.handler.storage.root())
            .map(|entries| entries.count() == 0)
            .unwrap_or(true));
    }

    #[tokio::test]
    async fn blank_title_is_a_validation_error() {
        let fx = fixture().await;

        let result = fx.handler.create(form("   ", fx.city_id), photo(&fx)).await;

        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn delete_removes_row_and_file() {
        let fx = fixture().await;
        let media = fx.handler.create(form("Ribeira", fx.city_id), photo(&fx)).await.unwrap();

        fx.handler.delete(media.id).await.unwrap();

        assert!(matches!(fx.handler.get(media.id, false).await, Err(AppError::MediaNotFound(_))));
        assert!(fx.handler.storage.resolve(&media.file_ref).await.is_none());
        assert!(matches!(fx.handler.delete(media.id).await, Err(AppError::MediaNotFound(_))));
    }

    #[tokio::test]
    async fn related_excludes_current_and_caps_at_limit() {
        let fx = fixture().await;
        let mut ids = Vec::new();
        for i in 0..9 {
            let media = fx
                .handler
                .create(form(&format!("Shot {i}"), fx.city_id), photo(&fx))
                .await
                .unwrap();
            ids.push(media.id);
        }
        let excluded = ids[6];

        let related = fx.handler.list_related(fx.city_id, excluded, 6).await.unwrap();

        assert_eq!(related.len(), 6);
        assert!(related.iter().all(|e| e.media.id != excluded));
        assert!(related
            .windows(2)
            .all(|w| (w[0].media.uploaded_at, w[0].media.id) >= (w[1].media.uploaded_at, w[1].media.id)));

        let detail = fx.handler.detail(excluded).await.unwrap();
        assert_eq!(detail.media.id, excluded);
        assert_eq!(detail.related.len(), 6);
    }
}
