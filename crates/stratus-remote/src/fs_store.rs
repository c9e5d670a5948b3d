//! Filesystem object store backend
//!
//! Objects live as flat files under a root directory, named by their object
//! name (a path hash or the backup object name - both single path segments).
//! Uploads are verified by byte count before being reported successful;
//! downloads create the destination's parent directories first, otherwise a
//! transfer can "succeed" without anything landing on disk.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use stratus_core::ports::IObjectStore;

/// Object store rooted at a local directory
pub struct FsObjectStore {
    root: PathBuf,
    remote_id: u32,
}

impl FsObjectStore {
    /// Create a store rooted at `root`. The directory is created on first
    /// upload if it does not exist yet.
    #[must_use]
    pub fn new(root: PathBuf, remote_id: u32) -> Self {
        Self { root, remote_id }
    }

    fn object_path(&self, object: &str) -> PathBuf {
        self.root.join(object)
    }
}

#[async_trait::async_trait]
impl IObjectStore for FsObjectStore {
    fn remote_id(&self) -> u32 {
        self.remote_id
    }

    fn name(&self) -> &str {
        "fs"
    }

    #[instrument(skip(self), fields(store = %self.root.display()))]
    async fn put(&self, source: &Path, object: &str) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;

        let dest = self.object_path(object);
        let copied = tokio::fs::copy(source, &dest).await?;

        let expected = tokio::fs::metadata(source).await?.len();
        if copied != expected {
            anyhow::bail!(
                "short write uploading {}: copied {copied} of {expected} bytes",
                source.display()
            );
        }

        debug!(object, bytes = copied, "object uploaded");
        Ok(())
    }

    #[instrument(skip(self), fields(store = %self.root.display()))]
    async fn get(&self, object: &str, dest: &Path) -> anyhow::Result<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let src = self.object_path(object);
        let copied = tokio::fs::copy(&src, dest).await?;

        debug!(object, bytes = copied, dest = %dest.display(), "object downloaded");
        Ok(())
    }

    async fn delete(&self, object: &str) -> anyhow::Result<()> {
        match tokio::fs::remove_file(self.object_path(object)).await {
            Ok(()) => {
                debug!(object, "object deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(object, "delete of missing object ignored");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> anyhow::Result<Vec<String>> {
        let mut objects = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            // a store nothing has been uploaded to yet is simply empty
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(objects),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                objects.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        objects.sort();
        Ok(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> FsObjectStore {
        FsObjectStore::new(dir.path().join("objects"), 1)
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src.txt");
        tokio::fs::write(&source, b"payload").await.unwrap();

        let store = store(&dir);
        store.put(&source, "obj1").await.unwrap();

        let dest = dir.path().join("out/nested/dst.txt");
        store.get("obj1", &dest).await.unwrap();
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_put_replaces_previous_object() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src.txt");
        let store = store(&dir);

        tokio::fs::write(&source, b"one").await.unwrap();
        store.put(&source, "obj").await.unwrap();
        tokio::fs::write(&source, b"two-longer").await.unwrap();
        store.put(&source, "obj").await.unwrap();

        let dest = dir.path().join("dst");
        store.get("obj", &dest).await.unwrap();
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"two-longer");
    }

    #[tokio::test]
    async fn test_list_names_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        tokio::fs::write(&source, b"x").await.unwrap();

        let store = store(&dir);
        for name in ["b-obj", "a-obj", "c-obj"] {
            store.put(&source, name).await.unwrap();
        }

        assert_eq!(store.list().await.unwrap(), vec!["a-obj", "b-obj", "c-obj"]);
    }

    #[tokio::test]
    async fn test_list_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store(&dir).list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        tokio::fs::write(&source, b"x").await.unwrap();

        let store = store(&dir);
        store.put(&source, "obj").await.unwrap();
        store.delete("obj").await.unwrap();
        store.delete("obj").await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_object_fails() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("dst");
        assert!(store(&dir).get("nope", &dest).await.is_err());
    }
}
