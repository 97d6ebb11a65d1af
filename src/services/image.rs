use crate::domain::Username;
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Picture formats accepted for profile pictures.
pub const PROFILE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Copies user-supplied profile pictures into the profiles directory.
pub struct ProfileImageService {
    dir: PathBuf,
}

impl ProfileImageService {
    #[must_use]
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Stores `source` as `<dir>/<username>.<ext>` and returns the stored path.
    pub async fn save_profile_picture(&self, username: &Username, source: &Path) -> Result<PathBuf> {
        let extension = source
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if !PROFILE_EXTENSIONS.contains(&extension.as_str()) {
            bail!(
                "Unsupported picture type '{}' (expected one of: {})",
                source.display(),
                PROFILE_EXTENSIONS.join(", ")
            );
        }

        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)
                .await
                .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        }

        let file_path = self.dir.join(format!("{username}.{extension}"));

        info!(source = %source.display(), path = %file_path.display(), "Saving profile picture");

        fs::copy(source, &file_path)
            .await
            .with_context(|| format!("Failed to copy picture to {}", file_path.display()))?;

        Ok(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("libris-image-{label}-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn copies_picture_named_after_user() {
        let root = scratch_dir("copy");
        fs::create_dir_all(&root).await.unwrap();
        let source = root.join("Me.PNG");
        fs::write(&source, b"not really a png").await.unwrap();

        let service = ProfileImageService::new(root.join("profiles"));
        let stored = service
            .save_profile_picture(&Username::from("alice"), &source)
            .await
            .unwrap();

        assert_eq!(stored, root.join("profiles").join("alice.png"));
        assert_eq!(fs::read(&stored).await.unwrap(), b"not really a png");
    }

    #[tokio::test]
    async fn rejects_unsupported_extension() {
        let root = scratch_dir("ext");
        let service = ProfileImageService::new(root.join("profiles"));
        let err = service
            .save_profile_picture(&Username::from("bob"), Path::new("notes.txt"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unsupported picture type"));
    }

    #[tokio::test]
    async fn missing_source_is_an_error() {
        let root = scratch_dir("missing");
        let service = ProfileImageService::new(root.join("profiles"));
        assert!(
            service
                .save_profile_picture(&Username::from("carol"), &root.join("gone.jpg"))
                .await
                .is_err()
        );
    }
}
