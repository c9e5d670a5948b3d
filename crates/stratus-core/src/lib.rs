//! Core domain logic for Stratus
//!
//! This crate holds everything the rest of the workspace agrees on:
//!
//! - The domain model: [`domain::FileVersion`] and the validated hash
//!   newtypes ([`domain::PathHash`], [`domain::ContentHash`])
//! - Typed configuration loaded from YAML ([`config::Config`])
//! - The content hasher ([`hash`]) and the backup object-name
//!   derivation ([`keys`])
//! - The durable-store statement model ([`statement::IndexStatement`])
//! - The port traits the watch engine, store, and replication
//!   coordinator are wired together through ([`ports`])
//!
//! It deliberately contains no I/O loops and no storage engine; those live
//! in the adapter crates (`stratus-store`, `stratus-remote`, `stratus-watch`).

pub mod config;
pub mod domain;
pub mod hash;
pub mod keys;
pub mod ports;
pub mod statement;

pub use config::Config;
pub use domain::{ContentHash, DomainError, FileVersion, PathHash};
pub use statement::IndexStatement;
