//! Per-render scratch directories.
//!
//! Every render gets its own uniquely named directory under a shared base.
//! The directory and everything in it is removed when the [`ScratchDir`] is
//! dropped, so success, failure, timeout and a dropped request future all
//! leave nothing behind.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::MediaResult;

/// A uniquely named directory that is deleted on drop.
#[derive(Debug)]
pub struct ScratchDir {
    id: Uuid,
    dir: TempDir,
}

impl ScratchDir {
    /// Create `render-<uuid>-XXXX` under `base`, creating `base` if needed.
    pub async fn create(base: impl AsRef<Path>) -> MediaResult<Self> {
        let base = base.as_ref();
        tokio::fs::create_dir_all(base).await?;

        let id = Uuid::new_v4();
        let dir = tempfile::Builder::new()
            .prefix(&format!("render-{}-", id))
            .tempdir_in(base)?;

        debug!(render_id = %id, path = %dir.path().display(), "Created scratch directory");
        Ok(Self { id, dir })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file inside the scratch directory.
    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Remove the directory now and report failures instead of ignoring them.
    pub fn close(self) -> MediaResult<()> {
        let id = self.id;
        self.dir.close()?;
        debug!(render_id = %id, "Removed scratch directory");
        Ok(())
    }
}

/// Remove a scratch base directory and all leftover render directories.
pub async fn remove_scratch_base(base: impl AsRef<Path>) {
    let base = base.as_ref();
    match tokio::fs::remove_dir_all(base).await {
        Ok(()) => debug!(path = %base.display(), "Removed scratch base"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %base.display(), "Failed to remove scratch base: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scratch_dirs_are_unique_and_removed_on_drop() {
        let base = tempfile::tempdir().unwrap();

        let a = ScratchDir::create(base.path()).await.unwrap();
        let b = ScratchDir::create(base.path()).await.unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().starts_with(base.path()));

        let file = a.join("source.png");
        tokio::fs::write(&file, b"data").await.unwrap();

        let a_path = a.path().to_path_buf();
        drop(a);
        assert!(!a_path.exists());
        assert!(b.path().exists());

        b.close().unwrap();
    }

    #[tokio::test]
    async fn test_create_makes_missing_base() {
        let root = tempfile::tempdir().unwrap();
        let base = root.path().join("nested").join("scratch");

        let scratch = ScratchDir::create(&base).await.unwrap();
        assert!(scratch.path().exists());
        assert!(scratch
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(&format!("render-{}", scratch.id())));

        remove_scratch_base(&base).await;
        assert!(!base.exists());
        // Removing twice is quiet
        remove_scratch_base(&base).await;
    }
}
