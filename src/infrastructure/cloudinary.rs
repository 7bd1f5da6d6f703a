use std::path::Path;

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::Deserialize;
use tracing::debug;

use crate::{errors::AppError, repositories::asset_store::RemoteAssetStore, settings::CloudinaryConfig};

const CLOUDINARY_API: &str = "https://api.cloudinary.com/v1_1";

/// Cloudinary client using unsigned upload presets.
#[derive(Debug, Clone)]
pub struct CloudinaryStore {
    client: Client,
    endpoint: String,
    upload_preset: String,
    folder: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

impl CloudinaryStore {
    pub fn new(config: &CloudinaryConfig) -> Self {
        CloudinaryStore {
            client: Client::new(),
            // resource_type "auto" lets Cloudinary tell images from videos
            endpoint: format!("{}/{}/auto/upload", CLOUDINARY_API, config.cloud_name),
            upload_preset: config.upload_preset.clone(),
            folder: config.folder.clone(),
        }
    }
}

#[async_trait]
impl RemoteAssetStore for CloudinaryStore {
    async fn upload(&self, local_path: &Path, public_id: &str) -> Result<String, AppError> {
        let bytes = tokio::fs::read(local_path).await?;
        let file_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(bytes).file_name(file_name))
            .text("upload_preset", self.upload_preset.clone())
            .text("folder", self.folder.clone())
            .text("public_id", public_id.to_string());

        let response = self.client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::InternalError(format!("Asset upload failed: {}", e)))?;

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::InternalError(format!("Invalid asset host response: {}", e)))?;

        debug!(public_id, url = %body.secure_url, "Asset uploaded");
        Ok(body.secure_url)
    }
}
