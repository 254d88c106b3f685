//! Filesystem helpers for the report output tree.

use std::path::Path;

use async_trait::async_trait;
use tokio::fs;

use crate::error::MediaResult;

/// Create `dir` (and parents) if it does not already exist.
pub async fn ensure_directory(dir: impl AsRef<Path>) -> MediaResult<()> {
    let dir = dir.as_ref();
    if !dir.exists() {
        fs::create_dir_all(dir).await?;
        tracing::debug!("Directory created: {}", dir.display());
    }
    Ok(())
}

/// Remove everything inside `dir`, creating it first if missing.
///
/// The directory itself is kept. Stops at the first entry that cannot be
/// removed.
pub async fn clean_directory(dir: impl AsRef<Path>) -> MediaResult<()> {
    let dir = dir.as_ref();
    ensure_directory(dir).await?;

    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_dir() {
            fs::remove_dir_all(&path).await?;
        } else {
            fs::remove_file(&path).await?;
        }
    }

    tracing::debug!("Directory cleaned: {}", dir.display());
    Ok(())
}

/// Clears the output tree before a run writes into it.
#[async_trait]
pub trait OutputCleaner: Send + Sync {
    async fn clean(&self, dir: &Path) -> MediaResult<()>;
}

/// [`OutputCleaner`] that empties the directory with [`clean_directory`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryCleaner;

#[async_trait]
impl OutputCleaner for DirectoryCleaner {
    async fn clean(&self, dir: &Path) -> MediaResult<()> {
        clean_directory(dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_ensure_directory_creates_nested() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("report").join("redFrames");

        ensure_directory(&nested).await.unwrap();
        ensure_directory(&nested).await.unwrap();

        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn test_clean_directory_removes_contents() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("report");
        fs::create_dir_all(root.join("luminanceFrames")).await.unwrap();
        fs::write(root.join("luminanceFrames/old.png"), b"png").await.unwrap();
        fs::write(root.join("index.html"), b"<html>").await.unwrap();

        clean_directory(&root).await.unwrap();

        assert!(root.is_dir(), "Root should be kept");
        let mut entries = fs::read_dir(&root).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clean_directory_creates_missing() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("fresh");

        clean_directory(&root).await.unwrap();

        assert!(root.is_dir());
    }

    #[tokio::test]
    async fn test_directory_cleaner() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("stale.png"), b"png").await.unwrap();

        DirectoryCleaner.clean(dir.path()).await.unwrap();

        assert!(!dir.path().join("stale.png").exists());
    }
}
