//! Watch engine
//!
//! Owns the in-memory [`WatchIndex`] and implements every operation of the
//! daemon core: registration, deletion, the two-pass change-detection scan,
//! persistence flush and restore, the index-backup protocol, downloads and
//! hash verification, and the upload-completion callback.
//!
//! ## Flow
//!
//! 1. **Registration** (control path or directory pass): classify the path,
//!    insert the watch, observe the first version via `add_file_version`
//! 2. **Scan** (timer): existing-file pass, then directory pass
//! 3. **Flush/backup** (slower timer): execute the buffered statements,
//!    then back up the store file if it changed
//! 4. **Completion** (replication callback): flip `remote_exists` on the
//!    confirmed version
//!
//! `add_file_version` is the sole path by which new versions enter the
//! system; both initial registration and change-detected re-registration
//! route through it.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{TimeZone, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use stratus_core::domain::newtypes::HASH_HEX_LEN;
use stratus_core::domain::{ContentHash, DomainError, FileVersion, PathHash};
use stratus_core::hash::{hash_contents, hash_path};
use stratus_core::ports::{
    DownloadRequest, IIndexStore, IReplicationQueue, IUploadListener, NEVER_BACKED_UP,
};
use stratus_core::IndexStatement;

use crate::fsutil;
use crate::index::{BackupRecord, WatchIndex};

/// An upload collected while the index lock was held, queued afterwards
type QueuedUpload = (PathBuf, PathHash, i64);

/// Format a stored modtime for human-readable listings.
pub fn format_modtime(modtime: i64) -> String {
    match Utc.timestamp_opt(modtime, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => modtime.to_string(),
    }
}

/// The watch/index/replication core of the daemon
///
/// All mutation happens under the single internal mutex; see the crate docs
/// for the consistency model.
pub struct WatchEngine {
    index: Mutex<WatchIndex>,
    store: Arc<dyn IIndexStore>,
    replicator: Arc<dyn IReplicationQueue>,
    backup_object_name: String,
}

impl WatchEngine {
    /// Create an engine over the given store and replication queue.
    ///
    /// `backup_object_name` is the deterministically derived backup slot for
    /// this daemon's master key; it is only persisted on the first run
    /// (restore finds no existing record).
    pub fn new(
        store: Arc<dyn IIndexStore>,
        replicator: Arc<dyn IReplicationQueue>,
        backup_object_name: String,
    ) -> Self {
        Self {
            index: Mutex::new(WatchIndex::default()),
            store,
            replicator,
            backup_object_name,
        }
    }

    /// The remote object name the index store is backed up under.
    #[must_use]
    pub fn backup_object(&self) -> &str {
        &self.backup_object_name
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Add a watch to a file or directory.
    ///
    /// Non-existent paths and unwatchable file types (devices, pipes,
    /// sockets) produce an informational response and no state change.
    pub async fn add_watch(&self, path: &Path, recursive: bool) -> String {
        let mut uploads = Vec::new();
        let response = {
            let mut index = self.index.lock().await;
            match std::fs::metadata(path) {
                Err(_) => format!("{} does not exist", path.display()),
                Ok(meta) if meta.is_dir() => {
                    Self::add_dir_watch(&mut index, path, recursive, &mut uploads)
                }
                Ok(meta) if meta.is_file() => {
                    Self::add_file_watch(&mut index, path, &mut uploads)
                }
                Ok(_) => format!("{} is not a watchable file type", path.display()),
            }
        };
        self.queue_uploads(uploads).await;
        response
    }

    fn add_dir_watch(
        index: &mut WatchIndex,
        path: &Path,
        recursive: bool,
        uploads: &mut Vec<QueuedUpload>,
    ) -> String {
        if index.dirs.contains_key(path) {
            return format!("directory watch already exists: {}", path.display());
        }

        index.dirs.insert(path.to_path_buf(), recursive);
        index.queue(IndexStatement::InsertDir {
            path: path.display().to_string(),
            recursive,
        });
        info!(path = %path.display(), recursive, "Added directory watch");

        let mut response = format!("added directory watch: {}", path.display());

        let entries = match std::fs::read_dir(path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to enumerate directory");
                return response;
            }
        };

        // recursion follows the literal directory tree; no symlink-loop
        // protection
        for entry in entries.flatten() {
            let child = entry.path();
            match std::fs::metadata(&child) {
                Ok(meta) if meta.is_dir() => {
                    if recursive {
                        response.push('\n');
                        response.push_str(&Self::add_dir_watch(index, &child, true, uploads));
                    }
                }
                Ok(meta) if meta.is_file() => {
                    response.push('\n');
                    response.push_str(&Self::add_file_watch(index, &child, uploads));
                }
                Ok(_) => {
                    info!(path = %child.display(), "Skipping unwatchable file type");
                }
                Err(e) => {
                    warn!(path = %child.display(), error = %e, "Failed to stat directory entry");
                }
            }
        }
        response
    }

    fn add_file_watch(
        index: &mut WatchIndex,
        path: &Path,
        uploads: &mut Vec<QueuedUpload>,
    ) -> String {
        // editor swap files churn constantly and never need mirroring
        if path.extension().is_some_and(|ext| ext == "swp") {
            return format!("ignored editor swap file: {}", path.display());
        }
        if index.files.contains_key(path) {
            return format!("file watch already exists: {}", path.display());
        }

        index.files.insert(path.to_path_buf(), Vec::new());
        if Self::add_file_version(index, path, uploads) {
            info!(path = %path.display(), "Added file watch");
            format!("added file watch: {}", path.display())
        } else {
            // the first observation failed; un-register so no path is ever
            // left with an empty version list
            index.files.remove(path);
            format!("could not observe {}", path.display())
        }
    }

    /// Observe the file at `path` and append a new current version.
    ///
    /// The sole entry point for new versions: initial registration and
    /// change-detected re-registration both come through here.
    fn add_file_version(
        index: &mut WatchIndex,
        path: &Path,
        uploads: &mut Vec<QueuedUpload>,
    ) -> bool {
        let modtime = match fsutil::modtime_secs(path) {
            Ok(modtime) => modtime,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read modtime, skipping version");
                return false;
            }
        };
        let path_hash = hash_path(path);
        let content_hash = match hash_contents(path) {
            Ok(hash) => Some(hash),
            Err(e) => {
                // the file may have vanished between listing and hashing
                warn!(path = %path.display(), error = %e, "Failed to hash file contents");
                None
            }
        };

        debug!(
            path = %path.display(),
            hash = &path_hash.as_str()[..10],
            modtime,
            "Recorded file version"
        );

        index.queue(IndexStatement::InsertFileVersion {
            path: path.display().to_string(),
            modtime,
            path_hash: path_hash.clone(),
            file_hash: content_hash
                .as_ref()
                .map(|h| h.as_str().to_string())
                .unwrap_or_default(),
            local_exists: true,
        });
        index.push_version(path, FileVersion::observed(modtime, path_hash.clone(), content_hash));
        uploads.push((path.to_path_buf(), path_hash, modtime));
        true
    }

    async fn queue_uploads(&self, uploads: Vec<QueuedUpload>) {
        for (path, path_hash, modtime) in uploads {
            self.replicator
                .enqueue_upload(&path, path_hash.as_str(), Some(modtime))
                .await;
        }
    }

    // ========================================================================
    // Deletion
    // ========================================================================

    /// Delete a watch. Unlike disappearance detection, which only flips a
    /// flag, this is destructive and irreversible locally: the version
    /// history is erased and a remote delete is queued per version.
    pub async fn del_watch(&self, path: &Path) -> String {
        let mut deletes = Vec::new();
        let response = {
            let mut index = self.index.lock().await;
            if index.dirs.contains_key(path) {
                Self::del_dir_watch(&mut index, path, &mut deletes)
            } else if index.files.contains_key(path) {
                Self::del_file_watch(&mut index, path, &mut deletes)
            } else {
                format!("no watch exists for {}", path.display())
            }
        };
        for object in deletes {
            self.replicator.enqueue_delete(object.as_str()).await;
        }
        response
    }

    fn del_dir_watch(
        index: &mut WatchIndex,
        path: &Path,
        deletes: &mut Vec<PathHash>,
    ) -> String {
        let recursive = index.dirs.get(path).copied().unwrap_or(false);
        let mut response = String::new();

        // children first: files, then subdirectories (respecting the
        // recursive flag), then the directory's own entry
        let child_files: Vec<PathBuf> = index
            .files
            .keys()
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect();
        for child in child_files {
            response.push_str(&Self::del_file_watch(index, &child, deletes));
            response.push('\n');
        }

        if recursive {
            let child_dirs: Vec<PathBuf> = index
                .dirs
                .keys()
                .filter(|p| p.parent() == Some(path))
                .cloned()
                .collect();
            for child in child_dirs {
                response.push_str(&Self::del_dir_watch(index, &child, deletes));
                response.push('\n');
            }
        }

        index.dirs.remove(path);
        index.queue(IndexStatement::DeleteDir {
            path: path.display().to_string(),
        });
        info!(path = %path.display(), "Deleted directory watch");
        let _ = write!(response, "deleted directory watch: {}", path.display());
        response
    }

    fn del_file_watch(
        index: &mut WatchIndex,
        path: &Path,
        deletes: &mut Vec<PathHash>,
    ) -> String {
        let Some(versions) = index.remove_file(path) else {
            return format!("no watch exists for {}", path.display());
        };

        // one remote delete per historical version
        for version in &versions {
            deletes.push(version.path_hash.clone());
        }

        index.queue(IndexStatement::DeleteFile {
            path: path.display().to_string(),
        });
        info!(path = %path.display(), versions = versions.len(), "Deleted file watch");
        format!(
            "deleted file watch: {} ({} versions)",
            path.display(),
            versions.len()
        )
    }

    // ========================================================================
    // Scan / change detection
    // ========================================================================

    /// One change-detection cycle: the existing-file pass, then the
    /// directory pass. Runs under the index lock for the whole scan,
    /// mutually exclusive with add/delete/restore and the callbacks.
    pub async fn scan(&self) {
        let mut uploads = Vec::new();
        {
            let mut index = self.index.lock().await;
            Self::scan_files(&mut index, &mut uploads);
            Self::scan_dirs(&mut index, &mut uploads);
        }
        self.queue_uploads(uploads).await;
    }

    fn scan_files(index: &mut WatchIndex, uploads: &mut Vec<QueuedUpload>) {
        let paths: Vec<PathBuf> = index.files.keys().cloned().collect();
        for path in paths {
            let (current_modtime, current_exists) = match index.current_version(&path) {
                Some(version) => (version.modtime, version.local_exists),
                None => continue,
            };

            // a vanished file is not polled further; it is only
            // re-discovered via the directory pass if it reappears
            if !current_exists {
                continue;
            }

            if !path.exists() {
                info!(path = %path.display(), "File no longer exists locally");
                if let Some(version) = index.files.get_mut(&path).and_then(|v| v.last_mut()) {
                    version.local_exists = false;
                }
                index.queue(IndexStatement::MarkLocalMissing {
                    path: path.display().to_string(),
                    modtime: current_modtime,
                });
                continue;
            }

            let modtime = match fsutil::modtime_secs(&path) {
                Ok(modtime) => modtime,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to stat watched file");
                    continue;
                }
            };

            if modtime != current_modtime {
                // a new version supersedes the old without removing history
                info!(path = %path.display(), "File change detected");
                if let Some(version) = index.files.get_mut(&path).and_then(|v| v.last_mut()) {
                    version.local_exists = false;
                }
                index.queue(IndexStatement::MarkLocalMissing {
                    path: path.display().to_string(),
                    modtime: current_modtime,
                });
                Self::add_file_version(index, &path, uploads);
            }
        }
    }

    fn scan_dirs(index: &mut WatchIndex, uploads: &mut Vec<QueuedUpload>) {
        let dirs: Vec<(PathBuf, bool)> = index
            .dirs
            .iter()
            .map(|(path, recursive)| (path.clone(), *recursive))
            .collect();

        for (path, recursive) in dirs {
            if !path.exists() {
                info!(path = %path.display(), "Directory no longer exists, removing watch");
                index.dirs.remove(&path);
                index.queue(IndexStatement::DeleteDir {
                    path: path.display().to_string(),
                });
                continue;
            }

            let entries = match std::fs::read_dir(&path) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to enumerate watched directory");
                    continue;
                }
            };

            for entry in entries.flatten() {
                let child = entry.path();
                match std::fs::metadata(&child) {
                    Ok(meta) if meta.is_dir() => {
                        if recursive && !index.dirs.contains_key(&child) {
                            info!(path = %child.display(), "New directory found");
                            Self::add_dir_watch(index, &child, true, uploads);
                        }
                    }
                    Ok(meta) if meta.is_file() => {
                        let tracked = index.files.contains_key(&child);
                        let vanished = index
                            .current_version(&child)
                            .map(|version| !version.local_exists)
                            .unwrap_or(false);
                        if !tracked {
                            info!(path = %child.display(), "New file found");
                            Self::add_file_watch(index, &child, uploads);
                        } else if vanished {
                            // the path came back: resume its history with a
                            // fresh current version
                            info!(path = %child.display(), "File reappeared");
                            Self::add_file_version(index, &child, uploads);
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    // ========================================================================
    // Persistence flush & restore
    // ========================================================================

    /// Execute the buffered statement queue as one batch and clear it.
    ///
    /// A failing batch is logged with the offending SQL and dropped;
    /// accepting the data-loss risk beats aborting the daemon.
    pub async fn flush(&self) {
        let pending = {
            let mut index = self.index.lock().await;
            index.take_pending()
        };
        if pending.is_empty() {
            return;
        }

        let sql = IndexStatement::render_batch(&pending);
        debug!(statements = pending.len(), "Flushing statement queue");
        if let Err(e) = self.store.execute(&sql).await {
            error!(error = %e, sql = %sql, "Failed to flush statement queue");
        }
    }

    /// Rebuild the in-memory index from the durable store. Must run before
    /// the first scan; a failure here is an unrecoverable startup error.
    pub async fn restore(&self) -> anyhow::Result<()> {
        let files = self
            .store
            .all_files()
            .await
            .context("failed to load file index")?;
        let dirs = self
            .store
            .all_dirs()
            .await
            .context("failed to load directory index")?;
        let backup = self
            .store
            .backup_record()
            .await
            .context("failed to load backup record")?;

        let mut index = self.index.lock().await;

        for row in files {
            let path_hash = match PathHash::new(row.path_hash) {
                Ok(hash) => hash,
                Err(e) => {
                    warn!(path = %row.path, error = %e, "Skipping malformed file row");
                    continue;
                }
            };
            let content_hash = if row.file_hash.is_empty() {
                None
            } else {
                match ContentHash::new(row.file_hash) {
                    Ok(hash) => Some(hash),
                    Err(e) => {
                        warn!(path = %row.path, error = %e, "Dropping malformed content hash");
                        None
                    }
                }
            };
            // rows arrive in insertion order, so appending preserves each
            // path's oldest-first version order
            index.push_version(
                Path::new(&row.path),
                FileVersion::restored(
                    row.modtime,
                    path_hash,
                    content_hash,
                    row.local_exists,
                    row.remote_exists,
                ),
            );
        }

        for row in dirs {
            index.dirs.insert(PathBuf::from(row.path), row.recursive);
        }

        match backup {
            Some(record) => {
                index.backup = Some(BackupRecord {
                    store_path: PathBuf::from(record.store_path),
                    object_name: record.object_name,
                    modtime: record.modtime,
                });
            }
            None => {
                // first run: persist the derived slot with an explicit
                // "never backed up" timestamp
                let store_path = self.store.location().to_path_buf();
                info!(object = %self.backup_object_name, "Derived index-backup object name");
                index.queue(IndexStatement::InsertBackupMeta {
                    store_path: store_path.display().to_string(),
                    object_name: self.backup_object_name.clone(),
                    modtime: NEVER_BACKED_UP,
                });
                index.backup = Some(BackupRecord {
                    store_path,
                    object_name: self.backup_object_name.clone(),
                    modtime: NEVER_BACKED_UP,
                });
            }
        }

        info!(
            files = index.files.len(),
            dirs = index.dirs.len(),
            "Index restored from durable store"
        );
        Ok(())
    }

    // ========================================================================
    // Index backup protocol
    // ========================================================================

    /// Back up the index store if its file changed since the last backup.
    ///
    /// The store is closed around the synchronous upload so the file on
    /// disk is quiescent, and the upload happens outside the index lock.
    /// The recorded timestamp is re-read from disk after the row update,
    /// because the update itself changes the store file's modtime.
    pub async fn backup_check(&self) {
        let record = {
            let index = self.index.lock().await;
            index.backup.clone()
        };
        let Some(record) = record else {
            return;
        };

        let store_modtime = match fsutil::modtime_secs(&record.store_path) {
            Ok(modtime) => modtime,
            Err(e) => {
                warn!(error = %e, "Failed to stat index store file");
                return;
            }
        };
        if record.modtime != NEVER_BACKED_UP && store_modtime <= record.modtime {
            return;
        }

        info!(object = %record.object_name, "Index store changed, backing up");

        if let Err(e) = self.store.close().await {
            error!(error = %e, "Failed to close index store for backup");
            return;
        }
        let result = self
            .replicator
            .upload_now(&record.store_path, &record.object_name)
            .await;
        if let Err(e) = self.store.reopen().await {
            error!(error = %e, "Failed to reopen index store after backup");
            return;
        }

        match result {
            Ok(report) => {
                info!(report = %report.trim_end(), "Backup upload finished");

                let observed = fsutil::modtime_secs(&record.store_path).unwrap_or(store_modtime);
                let update = IndexStatement::UpdateBackupModtime { modtime: observed };
                if let Err(e) = self.store.execute(&update.to_sql()).await {
                    error!(error = %e, "Failed to persist backup timestamp");
                }

                let post = fsutil::modtime_secs(&record.store_path).unwrap_or(observed);
                let mut index = self.index.lock().await;
                if let Some(backup) = index.backup.as_mut() {
                    backup.modtime = post;
                }
            }
            Err(e) => {
                // surfaced as text only; the reopened store keeps running
                // and the next tick retries
                warn!(error = %e, "Backup upload failed");
            }
        }
    }

    // ========================================================================
    // Download & verification
    // ========================================================================

    /// Queue downloads and execute them synchronously.
    ///
    /// Without a selector every current version is queued. A 64-character
    /// selector is treated as a hash candidate first (all versions of all
    /// paths are scanned for a path- or content-hash match), falling back
    /// to an exact path match. If nothing matches, the coordinator is never
    /// contacted.
    pub async fn download_files(&self, target: &Path, selector: Option<&str>) -> String {
        let requests = {
            let index = self.index.lock().await;
            Self::collect_downloads(&index, target, selector)
        };

        if requests.is_empty() {
            return match selector {
                Some(selector) => format!("not found: {selector}"),
                None => "not found: no files are being watched".to_string(),
            };
        }

        for request in requests {
            self.replicator.enqueue_download(request).await;
        }
        match self.replicator.drain_downloads().await {
            Ok(report) => report,
            Err(e) => format!("download failed: {e}"),
        }
    }

    fn collect_downloads(
        index: &WatchIndex,
        target: &Path,
        selector: Option<&str>,
    ) -> Vec<DownloadRequest> {
        let request_for = |path: &PathBuf, version: &FileVersion| DownloadRequest {
            path: path.clone(),
            object: version.path_hash.as_str().to_string(),
            modtime: Some(version.modtime),
            target: Some(target.to_path_buf()),
        };

        let mut requests = Vec::new();
        match selector {
            None => {
                for (path, versions) in &index.files {
                    if let Some(current) = versions.last() {
                        requests.push(request_for(path, current));
                    }
                }
            }
            Some(selector) => {
                if selector.len() == HASH_HEX_LEN {
                    for (path, versions) in &index.files {
                        for version in versions {
                            let matched = version.path_hash.as_str() == selector
                                || version
                                    .content_hash
                                    .as_ref()
                                    .is_some_and(|h| h.as_str() == selector);
                            if matched {
                                requests.push(request_for(path, version));
                            }
                        }
                    }
                }
                if requests.is_empty() {
                    // no hash matched (or the selector isn't hash-shaped):
                    // fall back to an exact path match
                    if let Some(current) = index
                        .files
                        .get(Path::new(selector))
                        .and_then(|versions| versions.last())
                    {
                        requests.push(request_for(&PathBuf::from(selector), current));
                    }
                }
            }
        }
        requests
    }

    /// Confirm that some version of the path resolved by `path_hash` has
    /// exactly this content hash. Used to check a retrieved object against
    /// an expected version.
    pub async fn verify_hash(&self, path_hash: &str, file_hash: &str) -> bool {
        let Ok(hash) = PathHash::new(path_hash.to_string()) else {
            return false;
        };
        let index = self.index.lock().await;
        let Some((path, _)) = index.resolve(&hash) else {
            return false;
        };
        let Some(versions) = index.files.get(&path) else {
            return false;
        };
        versions.iter().any(|version| {
            version.path_hash.as_str() == path_hash
                && version
                    .content_hash
                    .as_ref()
                    .is_some_and(|h| h.as_str() == file_hash)
        })
    }

    /// Resolve a remote object name back to its watched path and
    /// registration modtime.
    pub async fn resolve_path_hash(
        &self,
        object_name: &str,
    ) -> Result<(PathBuf, i64), DomainError> {
        let hash = PathHash::new(object_name.to_string())
            .map_err(|_| DomainError::UnknownPathHash(object_name.to_string()))?;
        let index = self.index.lock().await;
        index
            .resolve(&hash)
            .ok_or_else(|| DomainError::UnknownPathHash(object_name.to_string()))
    }

    // ========================================================================
    // Listing
    // ========================================================================

    /// Human-readable dump of the watched directories and files.
    pub async fn list_local(&self) -> String {
        let index = self.index.lock().await;
        let mut out = String::from("watched directories:\n");

        let mut dirs: Vec<_> = index.dirs.iter().collect();
        dirs.sort();
        for (path, recursive) in dirs {
            let _ = writeln!(out, "  {} recursive: {}", path.display(), recursive);
        }

        out.push_str("watched files:\n");
        let mut files: Vec<_> = index.files.iter().collect();
        files.sort_by(|a, b| a.0.cmp(b.0));
        for (path, versions) in files {
            if let Some(current) = versions.last() {
                let _ = writeln!(
                    out,
                    "  {} modtime: {} versions: {} local: {} remote: {}",
                    path.display(),
                    format_modtime(current.modtime),
                    versions.len(),
                    current.local_exists,
                    current.remote_exists
                );
            }
        }
        out
    }

    // ========================================================================
    // Shutdown
    // ========================================================================

    /// Drain the pending statement queue before exit.
    pub async fn shutdown(&self) {
        self.flush().await;
    }

    // ========================================================================
    // Read accessors (control surface and tests)
    // ========================================================================

    /// Number of recorded versions for a path (0 if not watched).
    pub async fn version_count(&self, path: &Path) -> usize {
        let index = self.index.lock().await;
        index.files.get(path).map(Vec::len).unwrap_or(0)
    }

    /// Snapshot of a path's version history, oldest first.
    pub async fn versions(&self, path: &Path) -> Vec<FileVersion> {
        let index = self.index.lock().await;
        index.files.get(path).cloned().unwrap_or_default()
    }

    /// Snapshot of the watched directory set.
    pub async fn watched_dirs(&self) -> Vec<(PathBuf, bool)> {
        let index = self.index.lock().await;
        let mut dirs: Vec<_> = index
            .dirs
            .iter()
            .map(|(path, recursive)| (path.clone(), *recursive))
            .collect();
        dirs.sort();
        dirs
    }

    /// Snapshot of the watched file set.
    pub async fn watched_files(&self) -> Vec<PathBuf> {
        let index = self.index.lock().await;
        let mut files: Vec<_> = index.files.keys().cloned().collect();
        files.sort();
        files
    }
}

// ============================================================================
// Upload-completion callback
// ============================================================================

#[async_trait::async_trait]
impl IUploadListener for WatchEngine {
    /// Flip `remote_exists` on the version the confirmed upload belongs to.
    ///
    /// Scanning newest-first is a deliberate tie-break: the most recently
    /// queued upload for a given path hash is assumed to be the one just
    /// confirmed. Completions for the backup object are not part of the
    /// file-version state machine and are ignored.
    async fn upload_success(
        &self,
        path: &Path,
        object_name: &str,
        remote_id: u32,
    ) -> anyhow::Result<()> {
        let mut index = self.index.lock().await;

        if object_name == self.backup_object_name
            || index
                .backup
                .as_ref()
                .is_some_and(|b| b.object_name == object_name)
        {
            debug!(object_name, "Ignoring backup-object completion");
            return Ok(());
        }

        let versions = index
            .files
            .get_mut(path)
            .ok_or_else(|| DomainError::PathNotFound(path.display().to_string()))?;

        let mut confirmed = None;
        for version in versions.iter_mut().rev() {
            if version.path_hash.as_str() == object_name {
                version.remote_exists = true;
                confirmed = Some(version.path_hash.clone());
                break;
            }
        }

        match confirmed {
            Some(path_hash) => {
                debug!(
                    path = %path.display(),
                    object_name,
                    remote_id,
                    "Version confirmed on remote"
                );
                index.queue(IndexStatement::MarkRemoteExists { path_hash });
            }
            None => {
                warn!(
                    path = %path.display(),
                    object_name,
                    "Upload completion matches no version of the path"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_modtime() {
        assert_eq!(format_modtime(0), "1970-01-01 00:00:00");
        assert_eq!(format_modtime(1700000000), "2023-11-14 22:13:20");
    }
}
