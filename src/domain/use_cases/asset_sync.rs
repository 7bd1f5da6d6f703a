use crate::entities::backup::SyncSummary;
use crate::errors::AppError;
use crate::query::MediaQuery;
use crate::repositories::{asset_store::RemoteAssetStore, media::MediaRepository};
use crate::storage::LocalMediaStorage;

/// Pushes locally stored media files to the remote asset host and points each
/// record at the hosted URL.
pub struct AssetSync<R, S>
where
    R: MediaRepository,
    S: RemoteAssetStore,
{
    pub repo: R,
    pub remote: S,
    pub storage: LocalMediaStorage,
}

impl<R, S> AssetSync<R, S>
where
    R: MediaRepository,
    S: RemoteAssetStore,
{
    pub fn new(repo: R, remote: S, storage: LocalMediaStorage) -> Self {
        AssetSync { repo, remote, storage }
    }

    /// Same id scheme as the assets already on the host.
    pub fn public_id(media_id: i64) -> String {
        format!("foto_{media_id}")
    }

    pub async fn run(&self) -> Result<SyncSummary, AppError> {
        let entries = self
            .repo
            .find_media(&MediaQuery::active().including_inactive())
            .await?;

        let mut summary = SyncSummary::default();

        for entry in entries {
            let media = entry.media;

            let Some(path) = self.storage.resolve(&media.file_ref).await else {
                tracing::debug!(media_id = media.id, file_ref = %media.file_ref, "No local file, skipped");
                summary.skipped += 1;
                continue;
            };

            let uploaded = match self.remote.upload(&path, &Self::public_id(media.id)).await {
                Ok(url) => self.repo.update_media_file_ref(media.id, &url).await,
                Err(e) => Err(e),
            };

            match uploaded {
                Ok(()) => {
                    tracing::info!(media_id = media.id, "Media synced to asset host");
                    summary.uploaded += 1;
                }
                Err(e) => {
                    tracing::error!(media_id = media.id, "Asset sync failed: {}", e);
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            uploaded = summary.uploaded,
            skipped = summary.skipped,
            failed = summary.failed,
            "Asset sync finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{city::NewCityRequest, media::MediaInsert};
    use crate::repositories::{
        asset_store::MockRemoteAssetStore, city::CityRepository, memory::InMemoryGalleryRepo,
    };
    use chrono::Utc;
    use tempfile::TempDir;

    async fn add_media(repo: &InMemoryGalleryRepo, city_id: i64, file_ref: &str) -> i64 {
        let now = Utc::now();
        repo.create_media(&MediaInsert {
            title: "Ribeira".into(),
            description: "River front".into(),
            file_ref: file_ref.into(),
            city_id,
            active: true,
            uploaded_at: now,
            updated_at: now,
        })
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn uploads_local_files_and_skips_the_rest() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"jpeg").unwrap();
        std::fs::write(dir.path().join("b.mp4"), b"mp4").unwrap();

        let repo = InMemoryGalleryRepo::new();
        let city = repo
            .create_city(&NewCityRequest::new("Porto", "Norte", "Portugal").prepare_for_insert())
            .await
            .unwrap();
        let local = add_media(&repo, city.id, "a.jpg").await;
        let broken = add_media(&repo, city.id, "b.mp4").await;
        add_media(&repo, city.id, "https://res.cloudinary.com/demo/image/upload/c.jpg").await;
        add_media(&repo, city.id, "missing.png").await;

        let mut remote = MockRemoteAssetStore::new();
        remote
            .expect_upload()
            .withf(move |_, public_id| *public_id == format!("foto_{local}"))
            .times(1)
            .returning(|_, _| Ok("https://res.cloudinary.com/demo/image/upload/foto_1.jpg".to_string()));
        remote
            .expect_upload()
            .withf(move |_, public_id| *public_id == format!("foto_{broken}"))
            .times(1)
            .returning(|_, _| Err(AppError::InternalError("quota exceeded".into())));

        let sync = AssetSync::new(repo.clone(), remote, LocalMediaStorage::new(dir.path()));
        let summary = sync.run().await.unwrap();

        assert_eq!(summary, SyncSummary { uploaded: 1, skipped: 2, failed: 1 });

        let synced = repo.get_media_entry(local).await.unwrap().unwrap();
        assert!(synced.media.file_ref.starts_with("https://"));
        let untouched = repo.get_media_entry(broken).await.unwrap().unwrap();
        assert_eq!(untouched.media.file_ref, "b.mp4");
    }

    #[test]
    fn public_ids_match_existing_hosted_assets() {
        assert_eq!(AssetSync::<InMemoryGalleryRepo, MockRemoteAssetStore>::public_id(7), "foto_7");
    }

    #[tokio::test]
    async fn nothing_to_sync() {
        let dir = TempDir::new().unwrap();
        let mut remote = MockRemoteAssetStore::new();
        remote.expect_upload().never();

        let sync = AssetSync::new(InMemoryGalleryRepo::new(), remote, LocalMediaStorage::new(dir.path()));

        assert_eq!(sync.run().await.unwrap(), SyncSummary::default());
    }
}
