//! Object store backend port (driven/secondary port)
//!
//! The transport contract a replication backend must satisfy. One concrete
//! backend ships today (a filesystem-rooted store in `stratus-remote`), but
//! the coordinator fans out to every registered backend and nothing in the
//! contract assumes exactly one.

use std::path::Path;

/// Port trait for a single remote object store
#[async_trait::async_trait]
pub trait IObjectStore: Send + Sync {
    /// Numeric identifier reported in upload-completion callbacks.
    fn remote_id(&self) -> u32;

    /// Human-readable backend name for logging.
    fn name(&self) -> &str;

    /// Upload the file at `source` under `object`, replacing any previous
    /// object of that name. Returns only after the transfer is verified.
    async fn put(&self, source: &Path, object: &str) -> anyhow::Result<()>;

    /// Download `object` to `dest`, creating parent directories as needed.
    async fn get(&self, object: &str, dest: &Path) -> anyhow::Result<()>;

    /// Delete `object`. Deleting a missing object is not an error.
    async fn delete(&self, object: &str) -> anyhow::Result<()>;

    /// List all object names in the store. May fail (credentials, transport).
    async fn list(&self) -> anyhow::Result<Vec<String>>;
}
