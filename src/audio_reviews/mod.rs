//! Storage for voice-recorded audio reviews.
//!
//! One file per library entry, named after the business key: the file for
//! movie `tt001` uploaded as `review.mp3` lands at
//! `{uploads_dir}/audio_reviews/tt001.mp3` and the entry records the
//! relative path `audio_reviews/tt001.mp3`.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Subdirectory of the uploads root holding review files. The relative path
/// recorded on entries starts with this, so any process resolving against
/// the same uploads root finds the same file.
const AUDIO_REVIEWS_SUBDIR: &str = "audio_reviews";

/// Extension used when the uploaded filename carries none.
const FALLBACK_EXTENSION: &str = "bin";

#[derive(Debug, Error)]
pub enum AudioReviewError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid movie id for attachment: {0}")]
    InvalidMovieId(String),
}

/// Filesystem store for audio review attachments.
///
/// The uploads directory is injected at construction; nothing here reads
/// ambient environment at call time.
pub struct AudioReviewStore {
    uploads_dir: PathBuf,
}

impl AudioReviewStore {
    pub fn new(uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
        }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Resolve a recorded relative path against the uploads root.
    pub fn resolve(&self, relative_path: &str) -> PathBuf {
        self.uploads_dir.join(relative_path)
    }

    /// Relative storage path a review for `movie_id` will occupy, derived
    /// from the sanitized id plus the uploaded filename's extension. The
    /// path is deterministic so the caller can record it on the entry
    /// before the file itself is written.
    pub fn relative_path_for(
        &self,
        movie_id: &str,
        original_filename: &str,
    ) -> Result<String, AudioReviewError> {
        Ok(format!(
            "{}/{}.{}",
            AUDIO_REVIEWS_SUBDIR,
            sanitize_movie_id(movie_id)?,
            extension_of(original_filename)
        ))
    }

    /// Write review data at a path from [`Self::relative_path_for`],
    /// replacing any previous file.
    ///
    /// `previous` is the relative path recorded on the entry before this
    /// upload; when it differs from the new path it is deleted so a
    /// re-upload with a different extension cannot leave a stray file
    /// behind.
    pub async fn store(
        &self,
        relative_path: &str,
        data: &[u8],
        previous: Option<&str>,
    ) -> Result<(), AudioReviewError> {
        let dir = self.uploads_dir.join(AUDIO_REVIEWS_SUBDIR);
        fs::create_dir_all(&dir).await?;

        if let Some(previous) = previous {
            if previous != relative_path {
                self.remove_file(previous).await;
            }
        }

        let path = self.resolve(relative_path);
        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        Ok(())
    }

    /// Best-effort delete of a recorded attachment file. Failure is logged
    /// and swallowed; the caller's operation must not depend on it.
    pub async fn remove_file(&self, relative_path: &str) {
        let path = self.resolve(relative_path);
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to delete audio review file {:?}: {}", path, e),
        }
    }
}

/// Lowercased alphanumeric extension of the uploaded filename, or the
/// fallback when there is none.
fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

/// The movie id becomes a filename component, so path separators and other
/// problematic characters are replaced before use.
fn sanitize_movie_id(movie_id: &str) -> Result<String, AudioReviewError> {
    if movie_id.is_empty() || movie_id.contains('\0') || movie_id.starts_with('.') {
        return Err(AudioReviewError::InvalidMovieId(movie_id.to_string()));
    }

    let sanitized: String = movie_id
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect();

    Ok(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn extension_is_derived_from_filename() {
        assert_eq!(extension_of("review.mp3"), "mp3");
        assert_eq!(extension_of("review.M4A"), "m4a");
        assert_eq!(extension_of("review"), "bin");
        assert_eq!(extension_of("review."), "bin");
        assert_eq!(extension_of("weird.e!t"), "bin");
    }

    #[test]
    fn movie_id_is_sanitized() {
        assert_eq!(sanitize_movie_id("tt001").unwrap(), "tt001");
        assert_eq!(sanitize_movie_id("a/b").unwrap(), "a_b");
        assert!(sanitize_movie_id("").is_err());
        assert!(sanitize_movie_id("..").is_err());
    }

    #[test]
    fn relative_path_is_deterministic() {
        let store = AudioReviewStore::new("/tmp/uploads");
        let path = store.relative_path_for("tt001", "review.mp3").unwrap();
        assert_eq!(path, "audio_reviews/tt001.mp3");
        assert_eq!(path, store.relative_path_for("tt001", "other.mp3").unwrap());
        assert!(store.relative_path_for("..", "review.mp3").is_err());
    }

    #[tokio::test]
    async fn store_writes_file_at_relative_path() {
        let dir = TempDir::new().unwrap();
        let store = AudioReviewStore::new(dir.path());

        let path = store.relative_path_for("tt001", "review.mp3").unwrap();
        store.store(&path, b"audio-bytes", None).await.unwrap();

        let stored = std::fs::read(store.resolve(&path)).unwrap();
        assert_eq!(stored, b"audio-bytes");
    }

    #[tokio::test]
    async fn restore_same_extension_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = AudioReviewStore::new(dir.path());

        let first = store.relative_path_for("tt001", "a.mp3").unwrap();
        store.store(&first, b"first", None).await.unwrap();

        let second = store.relative_path_for("tt001", "b.mp3").unwrap();
        assert_eq!(first, second);
        store.store(&second, b"second", Some(&first)).await.unwrap();

        let stored = std::fs::read(store.resolve(&second)).unwrap();
        assert_eq!(stored, b"second");
    }

    #[tokio::test]
    async fn restore_different_extension_leaves_no_stray_file() {
        let dir = TempDir::new().unwrap();
        let store = AudioReviewStore::new(dir.path());

        let first = store.relative_path_for("tt001", "a.mp3").unwrap();
        store.store(&first, b"first", None).await.unwrap();

        let second = store.relative_path_for("tt001", "b.m4a").unwrap();
        assert_ne!(first, second);
        store.store(&second, b"second", Some(&first)).await.unwrap();

        assert!(!store.resolve(&first).exists());
        assert_eq!(std::fs::read(store.resolve(&second)).unwrap(), b"second");
    }

    #[tokio::test]
    async fn remove_file_is_silent_on_missing() {
        let dir = TempDir::new().unwrap();
        let store = AudioReviewStore::new(dir.path());
        store.remove_file("audio_reviews/absent.mp3").await;
    }
}
