//! Durable index store port (driven/secondary port)
//!
//! The watch engine is the store's only writer. The contract is deliberately
//! narrow: execute a mutating statement batch, fetch all rows of a table,
//! and close/reopen the underlying file so the backup protocol can upload a
//! quiescent copy.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific and
//!   don't need domain-level classification.
//! - Rows are positional tuples of the three logical tables; reconstruction
//!   into domain types happens in the watch engine during restore.

use std::path::Path;

/// A watched-directory row: `(path, recursive)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirRow {
    pub path: String,
    pub recursive: bool,
}

/// A file-version row:
/// `(path, modtime, path_hash, file_hash, local_exists, remote_exists)`
///
/// `file_hash` is the empty string when the content hash was never computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRow {
    pub path: String,
    pub modtime: i64,
    pub path_hash: String,
    pub file_hash: String,
    pub local_exists: bool,
    pub remote_exists: bool,
}

/// The singleton backup-metadata row:
/// `(store_path, object_name, modtime)`
///
/// `modtime` is `0` when the store has never been backed up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRow {
    pub store_path: String,
    pub object_name: String,
    pub modtime: i64,
}

/// Sentinel for "never backed up" in [`BackupRow::modtime`]
pub const NEVER_BACKED_UP: i64 = 0;

/// Port trait for the durable index store
#[async_trait::async_trait]
pub trait IIndexStore: Send + Sync {
    /// Execute a batch of mutating SQL statements.
    ///
    /// A failing statement is a persistence error for the batch; callers log
    /// it and continue rather than aborting the daemon.
    async fn execute(&self, sql: &str) -> anyhow::Result<()>;

    /// Fetch all watched-directory rows.
    async fn all_dirs(&self) -> anyhow::Result<Vec<DirRow>>;

    /// Fetch all file-version rows, in insertion order.
    async fn all_files(&self) -> anyhow::Result<Vec<FileRow>>;

    /// Fetch the backup-metadata row, if one has been created.
    async fn backup_record(&self) -> anyhow::Result<Option<BackupRow>>;

    /// Close the store so the underlying file can be copied or uploaded.
    async fn close(&self) -> anyhow::Result<()>;

    /// Reopen the store after [`close`](IIndexStore::close).
    async fn reopen(&self) -> anyhow::Result<()>;

    /// Filesystem location of the store file.
    fn location(&self) -> &Path;
}
