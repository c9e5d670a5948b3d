//! Port traits (hexagonal architecture boundaries)
//!
//! The watch engine, durable store, and replication coordinator know each
//! other only through these traits, consumed as `Arc<dyn Trait + Send + Sync>`.

pub mod index_store;
pub mod object_store;
pub mod replication;

pub use index_store::{BackupRow, DirRow, FileRow, IIndexStore, NEVER_BACKED_UP};
pub use object_store::IObjectStore;
pub use replication::{DownloadRequest, IReplicationQueue, IUploadListener};
