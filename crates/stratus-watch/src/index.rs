//! In-memory watch index
//!
//! [`WatchIndex`] holds everything the engine knows between scans:
//!
//! - `files`   - watched path → versions, oldest-first; the last element is
//!   the current version and the list is never empty once registered
//! - `dirs`    - watched directory → recursive flag
//! - `reverse` - path hash → (original path, modtime at registration), for
//!   resolving remote object names back to human paths
//! - `pending` - buffered durable-store statements awaiting the next flush
//! - `backup`  - the index-backup record, once restored or derived
//!
//! The index is pure bookkeeping: no filesystem access, no I/O. The engine
//! drives it under its mutex and owns all side effects.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use stratus_core::domain::{FileVersion, PathHash};
use stratus_core::IndexStatement;

/// The index-backup record for this daemon instance
#[derive(Debug, Clone)]
pub struct BackupRecord {
    /// Location of the durable index store file
    pub store_path: PathBuf,
    /// Remote object name the store is backed up under
    pub object_name: String,
    /// Store-file modtime at the time of the last backup
    /// ([`stratus_core::ports::NEVER_BACKED_UP`] until the first one)
    pub modtime: i64,
}

/// The engine's in-memory view of everything it watches
#[derive(Default)]
pub struct WatchIndex {
    pub files: HashMap<PathBuf, Vec<FileVersion>>,
    pub dirs: HashMap<PathBuf, bool>,
    pub reverse: HashMap<PathHash, (PathBuf, i64)>,
    pub pending: Vec<IndexStatement>,
    pub backup: Option<BackupRecord>,
}

impl WatchIndex {
    /// Current (most recent) version of a path, if registered.
    pub fn current_version(&self, path: &Path) -> Option<&FileVersion> {
        self.files.get(path).and_then(|versions| versions.last())
    }

    /// Append a version to a path's history, registering the path if
    /// needed, and record the reverse lookup. Keeps insertion order, so the
    /// appended version becomes current.
    pub fn push_version(&mut self, path: &Path, version: FileVersion) {
        self.reverse
            .insert(version.path_hash.clone(), (path.to_path_buf(), version.modtime));
        self.files
            .entry(path.to_path_buf())
            .or_default()
            .push(version);
    }

    /// Remove a path and its whole version history; purges the reverse
    /// entries pointing at it. Returns the removed versions.
    pub fn remove_file(&mut self, path: &Path) -> Option<Vec<FileVersion>> {
        let versions = self.files.remove(path)?;
        for version in &versions {
            self.reverse.remove(&version.path_hash);
        }
        Some(versions)
    }

    /// Resolve a path hash back to its registered path and modtime.
    pub fn resolve(&self, hash: &PathHash) -> Option<(PathBuf, i64)> {
        self.reverse.get(hash).cloned()
    }

    /// Buffer a statement for the next persistence flush.
    pub fn queue(&mut self, statement: IndexStatement) {
        self.pending.push(statement);
    }

    /// Take the buffered statements, leaving the queue empty.
    pub fn take_pending(&mut self) -> Vec<IndexStatement> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(c: char) -> PathHash {
        PathHash::new(c.to_string().repeat(64)).unwrap()
    }

    fn version(modtime: i64, c: char) -> FileVersion {
        FileVersion::observed(modtime, hash(c), None)
    }

    #[test]
    fn test_push_version_keeps_order() {
        let mut index = WatchIndex::default();
        let path = Path::new("/f");

        index.push_version(path, version(1, 'a'));
        index.push_version(path, version(2, 'a'));
        index.push_version(path, version(3, 'a'));

        let versions = &index.files[path];
        assert_eq!(
            versions.iter().map(|v| v.modtime).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(index.current_version(path).unwrap().modtime, 3);
    }

    #[test]
    fn test_push_version_updates_reverse() {
        let mut index = WatchIndex::default();
        index.push_version(Path::new("/f"), version(1, 'a'));
        index.push_version(Path::new("/f"), version(9, 'a'));

        // later registrations win: the reverse entry carries the newest
        // registration modtime
        let (path, modtime) = index.resolve(&hash('a')).unwrap();
        assert_eq!(path, Path::new("/f"));
        assert_eq!(modtime, 9);
    }

    #[test]
    fn test_remove_file_purges_reverse() {
        let mut index = WatchIndex::default();
        index.push_version(Path::new("/f"), version(1, 'a'));
        index.push_version(Path::new("/g"), version(1, 'b'));

        let removed = index.remove_file(Path::new("/f")).unwrap();
        assert_eq!(removed.len(), 1);
        assert!(index.resolve(&hash('a')).is_none());
        assert!(index.resolve(&hash('b')).is_some());
    }

    #[test]
    fn test_remove_unknown_file() {
        let mut index = WatchIndex::default();
        assert!(index.remove_file(Path::new("/missing")).is_none());
    }

    #[test]
    fn test_take_pending_drains_queue() {
        let mut index = WatchIndex::default();
        index.queue(IndexStatement::DeleteDir {
            path: "/d".to_string(),
        });

        let taken = index.take_pending();
        assert_eq!(taken.len(), 1);
        assert!(index.pending.is_empty());
    }
}
