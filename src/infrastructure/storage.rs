//! Local file storage for uploaded media.

use std::{
    io,
    path::{Component, Path, PathBuf},
};

use tokio::fs;
use uuid::Uuid;

use crate::upload::ClassifiedFile;

#[derive(Debug, Clone)]
pub struct LocalMediaStorage {
    root: PathBuf,
}

impl LocalMediaStorage {
    /// Operations are relative to `root`; it is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalMediaStorage { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// References that point at a remote host rather than this storage.
    pub fn is_remote(file_ref: &str) -> bool {
        url::Url::parse(file_ref).is_ok_and(|url| url.has_host())
    }

    /// Writes the file under a generated `<uuid>.<ext>` key and returns the key.
    pub async fn store(&self, file: &ClassifiedFile) -> io::Result<String> {
        fs::create_dir_all(&self.root).await?;

        let key = format!("{}.{}", Uuid::new_v4().simple(), file.extension);
        fs::write(self.root.join(&key), &file.bytes).await?;

        Ok(key)
    }

    /// Maps a reference to a path inside the root; `None` for remote or escaping refs.
    pub fn local_path(&self, file_ref: &str) -> Option<PathBuf> {
        if file_ref.trim().is_empty() || Self::is_remote(file_ref) {
            return None;
        }

        let relative = Path::new(file_ref);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

        safe.then(|| self.root.join(relative))
    }

    /// Path of a stored file that actually exists on disk.
    pub async fn resolve(&self, file_ref: &str) -> Option<PathBuf> {
        let path = self.local_path(file_ref)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Some(path),
            _ => None,
        }
    }

    /// Removes a stored file; remote references and missing files are a no-op.
    pub async fn remove(&self, file_ref: &str) -> io::Result<()> {
        let Some(path) = self.local_path(file_ref) else {
            return Ok(());
        };

        match fs::remove_file(path).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
