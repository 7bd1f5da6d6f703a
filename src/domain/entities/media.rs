use std::path::Path;

use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::upload::DEFAULT_VIDEO_EXTENSIONS;

// ───── Constants ──────────────────────────────────────────────────────
const MAX_TITLE_LENGTH: u64 = 200;

// ───── Media Type ────────────────────────────────────────────────────

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[display("photo")]
    Photo,
    #[display("video")]
    Video,
}

impl MediaType {
    /// Derives the type of a stored file reference from its extension.
    ///
    /// Works for storage keys (`3f2c.mp4`) and absolute URLs alike; query strings
    /// and fragments are ignored. Anything that is not a known video reads as a photo.
    pub fn from_file_ref(file_ref: &str) -> Self {
        let path = match url::Url::parse(file_ref) {
            Ok(url) => url.path().to_string(),
            Err(_) => file_ref.to_string(),
        };

        let is_video = Path::new(&path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .is_some_and(|ext| DEFAULT_VIDEO_EXTENSIONS.contains(&ext.as_str()));

        if is_video { MediaType::Video } else { MediaType::Photo }
    }
}

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Media {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub file_ref: String,
    pub city_id: i64,
    pub active: bool,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Media {
    pub fn media_type(&self) -> MediaType {
        MediaType::from_file_ref(&self.file_ref)
    }
}

/// A media row joined with the city it belongs to.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct MediaEntry {
    #[sqlx(flatten)]
    pub media: Media,
    pub city_name: String,
    pub city_state: String,
    pub city_country: String,
}

#[derive(Debug)]
pub struct MediaInsert {
    pub title: String,
    pub description: String,
    pub file_ref: String,
    pub city_id: i64,
    pub active: bool,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub file_ref: String,
    pub media_type: MediaType,
    pub city_id: i64,
    pub city_name: String,
    pub city_state: String,
    pub city_country: String,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MediaCreatedResponse {
    pub id: i64,
    pub media_type: MediaType,
    pub file_ref: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MediaDetail {
    pub media: MediaResponse,
    pub related: Vec<MediaResponse>,
}

// ───── Input & Validation ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewMediaForm {
    #[validate(length(min = 1, max = MAX_TITLE_LENGTH, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: String,

    pub city_id: i64,
}

impl NewMediaForm {
    pub fn normalized(self) -> Self {
        NewMediaForm {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            city_id: self.city_id,
        }
    }

    pub fn prepare_for_insert(&self, file_ref: String) -> MediaInsert {
        let now = Utc::now();
        MediaInsert {
            title: self.title.clone(),
            description: self.description.clone(),
            file_ref,
            city_id: self.city_id,
            active: true,
            uploaded_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, MultipartForm)]
pub struct MediaUpload {
    #[multipart(rename = "file")]
    pub file: TempFile,

    pub title: Text<String>,

    pub description: Text<String>,

    pub city_id: Text<i64>,
}

impl MediaUpload {
    pub fn form(&self) -> NewMediaForm {
        NewMediaForm {
            title: self.title.0.clone(),
            description: self.description.0.clone(),
            city_id: self.city_id.0,
        }
    }
}

// ───── Conversions ──────────────────────────────────────────────────

impl MediaEntry {
    pub fn media_type(&self) -> MediaType {
        self.media.media_type()
    }

    pub fn to_response(&self) -> MediaResponse {
        MediaResponse {
            id: self.media.id,
            title: self.media.title.clone(),
            description: self.media.description.clone(),
            file_ref: self.media.file_ref.clone(),
            media_type: self.media_type(),
            city_id: self.media.city_id,
            city_name: self.city_name.clone(),
            city_state: self.city_state.clone(),
            city_country: self.city_country.clone(),
            uploaded_at: self.media.uploaded_at,
            updated_at: self.media.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_type_from_storage_key() {
        assert_eq!(MediaType::from_file_ref("a1b2.MP4"), MediaType::Video);
        assert_eq!(MediaType::from_file_ref("a1b2.webm"), MediaType::Video);
        assert_eq!(MediaType::from_file_ref("a1b2.jpeg"), MediaType::Photo);
    }

    #[test]
    fn derives_type_from_url_ignoring_query() {
        let url = "https://res.cloudinary.com/demo/video/upload/v1/photoskeka/media_4.ogg?x=1";
        assert_eq!(MediaType::from_file_ref(url), MediaType::Video);
    }

    #[test]
    fn unknown_extension_reads_as_photo() {
        assert_eq!(MediaType::from_file_ref("legacy/file"), MediaType::Photo);
        assert_eq!(MediaType::from_file_ref("notes.txt"), MediaType::Photo);
    }

    #[test]
    fn form_is_trimmed_before_validation() {
        let form = NewMediaForm {
            title: "   ".into(),
            description: " Ribeira at dusk ".into(),
            city_id: 1,
        }
        .normalized();

        assert_eq!(form.description, "Ribeira at dusk");
        assert!(form.validate().is_err());
    }
}
