use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use log::info;
use uuid::Uuid;

use crate::{constants::RECIPE_IMAGE_DIR, error::ApiError};

/// Storage path for a new recipe image: `uploads/recipe/<uuid>.<ext>`.
pub fn recipe_image_file_path(filename: &str) -> String {
    recipe_image_file_path_with(Uuid::new_v4(), filename)
}

/// Same as [`recipe_image_file_path`] with a caller supplied identifier.
///
/// The extension is whatever follows the last `.`; a name without one is used
/// as the extension as a whole.
pub fn recipe_image_file_path_with(id: impl Display, filename: &str) -> String {
    let ext = filename.rsplit('.').next().unwrap_or(filename);

    format!("{RECIPE_IMAGE_DIR}/{id}.{ext}")
}

/// Rejects bodies that are not a recognizable image.
pub fn validate_image(bytes: &[u8]) -> Result<(), ApiError> {
    image::guess_format(bytes).map(|_| ()).map_err(|_| {
        ApiError::validation(
            "image",
            "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
        )
    })
}

/// Uploaded files on local disk, served back under `url`.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    url: String,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        let mut url = url.into();
        if !url.ends_with('/') {
            url.push('/');
        }

        Self {
            root: root.into(),
            url,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn url(&self, relative: &str) -> String {
        format!("{}{}", self.url, relative)
    }

    /// Single path segment the files are served under locally, when `url` is
    /// of the form `/<segment>/`.
    pub fn mount_point(&self) -> Option<String> {
        let segment = self.url.trim_matches('/');

        (self.url.starts_with('/') && !segment.is_empty() && !segment.contains('/'))
            .then(|| segment.to_string())
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub async fn save(&self, relative: &str, bytes: &[u8]) -> Result<PathBuf, ApiError> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        info!("Stored upload {} ({} bytes)", path.display(), bytes.len());

        Ok(path)
    }
}
