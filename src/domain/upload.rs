//! Upload validation: classifies an incoming file as photo or video and
//! enforces the per-type size limit.

use std::{fmt, path::Path};

use crate::{entities::media::MediaType, errors::UploadError};

pub const MEGABYTE: u64 = 1024 * 1024;
pub const DEFAULT_MAX_PHOTO_BYTES: u64 = 5 * MEGABYTE;
pub const DEFAULT_MAX_VIDEO_BYTES: u64 = 50 * MEGABYTE;
pub const DEFAULT_PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "ogg"];

/// Limits and extension sets applied by [`MediaValidator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRules {
    pub max_photo_bytes: u64,
    pub max_video_bytes: u64,
    pub photo_extensions: Vec<String>,
    pub video_extensions: Vec<String>,
}

impl Default for UploadRules {
    fn default() -> Self {
        UploadRules {
            max_photo_bytes: DEFAULT_MAX_PHOTO_BYTES,
            max_video_bytes: DEFAULT_MAX_VIDEO_BYTES,
            photo_extensions: DEFAULT_PHOTO_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            video_extensions: DEFAULT_VIDEO_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl UploadRules {
    pub fn limit_for(&self, media_type: MediaType) -> u64 {
        match media_type {
            MediaType::Photo => self.max_photo_bytes,
            MediaType::Video => self.max_video_bytes,
        }
    }

    /// Video wins when an extension appears in both sets.
    pub fn media_type_for(&self, extension: &str) -> Option<MediaType> {
        if self.video_extensions.iter().any(|e| e == extension) {
            Some(MediaType::Video)
        } else if self.photo_extensions.iter().any(|e| e == extension) {
            Some(MediaType::Photo)
        } else {
            None
        }
    }

    /// Largest accepted payload across both types.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_photo_bytes.max(self.max_video_bytes)
    }

    pub fn unsupported_format(&self) -> UploadError {
        UploadError::UnsupportedFormat {
            images: dotted_list(&self.photo_extensions),
            videos: dotted_list(&self.video_extensions),
        }
    }
}

fn dotted_list(extensions: &[String]) -> String {
    extensions
        .iter()
        .map(|e| format!(".{e}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Lower-cased extension of a file name, without the leading dot.
pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Canonical content type for an accepted extension.
pub fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogg" => "video/ogg",
        _ => "application/octet-stream",
    }
}

// ───── Classification ───────────────────────────────────────────────

/// Decides whether a file is a photo or a video.
pub trait FileClassifier: Send + Sync + fmt::Debug {
    fn classify(
        &self,
        rules: &UploadRules,
        file_name: &str,
        payload: &[u8],
    ) -> Result<MediaType, UploadError>;
}

/// Extension-only classification. A renamed executable passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionClassifier;

impl FileClassifier for ExtensionClassifier {
    fn classify(
        &self,
        rules: &UploadRules,
        file_name: &str,
        _payload: &[u8],
    ) -> Result<MediaType, UploadError> {
        file_extension(file_name)
            .and_then(|ext| rules.media_type_for(&ext))
            .ok_or_else(|| rules.unsupported_format())
    }
}

/// Extension classification confirmed by magic-byte inspection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentSniffingClassifier;

impl FileClassifier for ContentSniffingClassifier {
    fn classify(
        &self,
        rules: &UploadRules,
        file_name: &str,
        payload: &[u8],
    ) -> Result<MediaType, UploadError> {
        let media_type = ExtensionClassifier.classify(rules, file_name, payload)?;
        let extension = file_extension(file_name).unwrap_or_default();

        let mismatch = |detected: &str| UploadError::ContentMismatch {
            extension: extension.clone(),
            detected: detected.to_string(),
        };

        let kind = infer::get(payload).ok_or_else(|| mismatch("unknown"))?;
        let detected = match kind.matcher_type() {
            infer::MatcherType::Image => Some(MediaType::Photo),
            infer::MatcherType::Video => Some(MediaType::Video),
            // Ogg containers are reported as audio regardless of the streams inside
            infer::MatcherType::Audio if kind.extension() == "ogg" => Some(MediaType::Video),
            _ => None,
        };

        match detected {
            Some(found) if found == media_type => Ok(media_type),
            _ => Err(mismatch(kind.mime_type())),
        }
    }
}

// ───── Validation ───────────────────────────────────────────────────

/// An upload that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFile {
    pub file_name: String,
    pub extension: String,
    pub media_type: MediaType,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ClassifiedFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Debug)]
pub struct MediaValidator {
    rules: UploadRules,
    classifier: Box<dyn FileClassifier>,
}

impl Default for MediaValidator {
    fn default() -> Self {
        MediaValidator::new(UploadRules::default())
    }
}

impl MediaValidator {
    pub fn new(rules: UploadRules) -> Self {
        MediaValidator {
            rules,
            classifier: Box::new(ExtensionClassifier),
        }
    }

    pub fn with_classifier(mut self, classifier: impl FileClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn rules(&self) -> &UploadRules {
        &self.rules
    }

    /// Classifies the file by extension, then checks its size against the limit
    /// for that classification.
    pub fn validate(
        &self,
        payload: Vec<u8>,
        file_name: &str,
        declared_content_type: Option<&str>,
    ) -> Result<ClassifiedFile, UploadError> {
        let file_name = file_name.trim();
        if file_name.is_empty() {
            return Err(UploadError::MissingFileName);
        }

        let media_type = self.classifier.classify(&self.rules, file_name, &payload)?;

        let limit = self.rules.limit_for(media_type);
        if payload.len() as u64 > limit {
            return Err(UploadError::FileTooLarge {
                kind: media_type,
                limit_mb: limit / MEGABYTE,
            });
        }

        let extension = file_extension(file_name).unwrap_or_default();
        let content_type = content_type_for(&extension);

        if let Some(declared) = declared_content_type {
            let declared_family = declared.split('/').next().unwrap_or_default();
            let expected_family = content_type.split('/').next().unwrap_or_default();
            if !declared_family.eq_ignore_ascii_case(expected_family) {
                tracing::warn!(
                    file_name,
                    declared,
                    classified = %media_type,
                    "Declared content type disagrees with file extension"
                );
            }
        }

        Ok(ClassifiedFile {
            file_name: file_name.to_string(),
            extension,
            media_type,
            content_type: content_type.to_string(),
            bytes: payload,
        })
    }
}
