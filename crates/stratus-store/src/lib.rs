//! SQLite durable index store for Stratus
//!
//! Implements the [`stratus_core::ports::IIndexStore`] port on top of a
//! SQLite file. The store holds three logical tables:
//!
//! - `dir_index`    - watched directories `(path, recursive)`
//! - `file_index`   - file versions `(path, modtime, path_hash, file_hash,
//!   local_exists, remote_exists)`
//! - `backup_meta`  - the singleton backup record `(store_path,
//!   object_name, modtime)`
//!
//! The watch engine is the only writer; all reads happen during startup
//! restore. The store can be closed and reopened at runtime so the backup
//! protocol can upload the file while no connection holds it open.

mod error;
mod store;

pub use error::StoreError;
pub use store::SqliteIndexStore;
