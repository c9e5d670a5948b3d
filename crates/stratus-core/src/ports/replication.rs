//! Replication queue and completion-callback ports
//!
//! The watch engine and the replication coordinator hold mutual references
//! in spirit but not in type: the engine owns an [`IReplicationQueue`]
//! capability for queueing work, and the coordinator owns a one-way
//! [`IUploadListener`] handle for reporting completions. Neither sees the
//! other's full state, which breaks the ownership cycle.

use std::path::{Path, PathBuf};

/// A queued download of one remote object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Original watched path the object was uploaded from
    pub path: PathBuf,
    /// Remote object name (the path hash, or the backup object name)
    pub object: String,
    /// Modtime of the requested version, when known
    pub modtime: Option<i64>,
    /// Directory to download under; the watched path's directory structure
    /// is recreated beneath it
    pub target: Option<PathBuf>,
}

/// Port trait for queueing replication work (exposed by the coordinator)
#[async_trait::async_trait]
pub trait IReplicationQueue: Send + Sync {
    /// Queue an upload of `path` under `object`. `modtime` is carried for
    /// fresh-content uploads; the path-hash-only variant passes `None`.
    async fn enqueue_upload(&self, path: &Path, object: &str, modtime: Option<i64>);

    /// Queue a download.
    async fn enqueue_download(&self, request: DownloadRequest);

    /// Queue a remote delete. Returns `false` if the request was not
    /// accepted (no backend registered).
    async fn enqueue_delete(&self, object: &str) -> bool;

    /// Upload `path` under `object` synchronously, bypassing the queue.
    /// Used only for the index-store backup, where the caller must know the
    /// transfer finished before reopening the store. Returns a textual
    /// per-backend result.
    async fn upload_now(&self, path: &Path, object: &str) -> anyhow::Result<String>;

    /// Drain and execute the download queue synchronously; returns a
    /// textual result describing each transfer.
    async fn drain_downloads(&self) -> anyhow::Result<String>;

    /// List object names across registered backends. May fail; the failure
    /// is surfaced to the caller as an error string.
    async fn list_objects(&self) -> anyhow::Result<Vec<String>>;
}

/// Port trait for upload-completion callbacks (implemented by the engine)
#[async_trait::async_trait]
pub trait IUploadListener: Send + Sync {
    /// Called by the coordinator once an upload of `path` under
    /// `object_name` has been confirmed by backend `remote_id`.
    ///
    /// An unknown `path` is a logic error and is surfaced to the caller
    /// rather than swallowed.
    async fn upload_success(
        &self,
        path: &Path,
        object_name: &str,
        remote_id: u32,
    ) -> anyhow::Result<()>;
}
