//! File versions
//!
//! A [`FileVersion`] is one recorded observation of a watched file. A watched
//! file maps to a `Vec<FileVersion>` ordered oldest-first by insertion; the
//! last element is always the current version, and the list is never empty
//! once the path is registered.

use serde::{Deserialize, Serialize};

use super::newtypes::{ContentHash, PathHash};

/// One observed state of a watched file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileVersion {
    /// Modification timestamp at observation time (seconds resolution)
    pub modtime: i64,
    /// Stable hash of the absolute path; shared by all versions of a path
    pub path_hash: PathHash,
    /// Hash of the file bytes at observation time; `None` when the content
    /// was never hashed (e.g. a row restored from a store that predates
    /// content hashing)
    pub content_hash: Option<ContentHash>,
    /// Whether the file existed on disk when last checked
    pub local_exists: bool,
    /// Whether this version has been confirmed uploaded to a remote
    pub remote_exists: bool,
}

impl FileVersion {
    /// A freshly observed version: exists locally, not yet uploaded
    #[must_use]
    pub fn observed(modtime: i64, path_hash: PathHash, content_hash: Option<ContentHash>) -> Self {
        Self {
            modtime,
            path_hash,
            content_hash,
            local_exists: true,
            remote_exists: false,
        }
    }

    /// A version reconstructed from a durable-store row, flags included
    #[must_use]
    pub fn restored(
        modtime: i64,
        path_hash: PathHash,
        content_hash: Option<ContentHash>,
        local_exists: bool,
        remote_exists: bool,
    ) -> Self {
        Self {
            modtime,
            path_hash,
            content_hash,
            local_exists,
            remote_exists,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(c: char) -> PathHash {
        PathHash::new(c.to_string().repeat(64)).unwrap()
    }

    #[test]
    fn test_observed_flags() {
        let v = FileVersion::observed(1700000000, hash('a'), None);
        assert!(v.local_exists);
        assert!(!v.remote_exists);
        assert_eq!(v.modtime, 1700000000);
    }

    #[test]
    fn test_restored_preserves_flags() {
        let v = FileVersion::restored(42, hash('b'), None, false, true);
        assert!(!v.local_exists);
        assert!(v.remote_exists);
    }
}
