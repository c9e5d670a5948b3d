//! Replication coordinator and object store backends for Stratus
//!
//! The [`ReplicationCoordinator`] owns the upload/download/delete queues the
//! watch engine feeds, fans work out to every registered
//! [`stratus_core::ports::IObjectStore`] backend, and reports confirmed
//! uploads back through a one-way [`stratus_core::ports::IUploadListener`]
//! handle.
//!
//! One concrete backend ships today: [`FsObjectStore`], an object store
//! rooted at a local directory (typically a mounted remote filesystem).
//! Network transports implement the same port.

mod coordinator;
mod fs_store;

pub use coordinator::ReplicationCoordinator;
pub use fs_store::FsObjectStore;
