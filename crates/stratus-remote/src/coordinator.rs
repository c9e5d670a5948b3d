//! Replication coordinator
//!
//! Owns the transfer queues and the registered backends. The watch engine
//! talks to it only through the [`IReplicationQueue`] port; completions flow
//! back through the [`IUploadListener`] handle registered at wiring time.
//! The coordinator never reaches into the engine's state.
//!
//! Queueing operations are non-blocking appends. Uploads and deletes are
//! drained asynchronously by [`ReplicationCoordinator::run`] on a poll
//! interval; downloads are drained synchronously on demand
//! ([`drain_downloads`](IReplicationQueue::drain_downloads)) because the
//! caller wants the textual outcome. The backup path uses
//! [`upload_now`](IReplicationQueue::upload_now), which bypasses the queue
//! entirely so the index store stays closed for the minimum time.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use stratus_core::ports::{DownloadRequest, IObjectStore, IReplicationQueue, IUploadListener};

/// A queued upload of one file version
#[derive(Debug, Clone)]
struct UploadRequest {
    path: PathBuf,
    object: String,
    modtime: Option<i64>,
}

#[derive(Default)]
struct TransferQueues {
    uploads: VecDeque<UploadRequest>,
    downloads: VecDeque<DownloadRequest>,
    deletes: VecDeque<String>,
}

/// Batches and forwards replication work to the registered backends
pub struct ReplicationCoordinator {
    backends: Vec<Arc<dyn IObjectStore>>,
    queues: Mutex<TransferQueues>,
    listener: RwLock<Option<Arc<dyn IUploadListener>>>,
    download_dir: PathBuf,
}

impl ReplicationCoordinator {
    /// Create a coordinator fanning out to `backends`. Downloads without an
    /// explicit target land under `download_dir`.
    #[must_use]
    pub fn new(backends: Vec<Arc<dyn IObjectStore>>, download_dir: PathBuf) -> Self {
        Self {
            backends,
            queues: Mutex::new(TransferQueues::default()),
            listener: RwLock::new(None),
            download_dir,
        }
    }

    /// Register the completion-callback handle. Called once at wiring time,
    /// after the watch engine exists.
    pub async fn set_listener(&self, listener: Arc<dyn IUploadListener>) {
        *self.listener.write().await = Some(listener);
    }

    /// Transfer loop: drains the upload and delete queues on `poll_interval`
    /// until `shutdown` fires. A final drain runs on the way out so queued
    /// work is not dropped by shutdown.
    pub async fn run(self: Arc<Self>, poll_interval: Duration, shutdown: CancellationToken) {
        info!(
            backends = self.backends.len(),
            poll_secs = poll_interval.as_secs(),
            "Replication coordinator started"
        );

        let mut interval = tokio::time::interval(poll_interval);
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.drain_uploads().await;
                    self.drain_deletes().await;
                }
                _ = shutdown.cancelled() => {
                    info!("Shutdown signal received, draining transfer queues");
                    self.drain_uploads().await;
                    self.drain_deletes().await;
                    break;
                }
            }
        }

        info!("Replication coordinator terminated");
    }

    async fn drain_uploads(&self) {
        let pending: Vec<UploadRequest> = {
            let mut queues = self.queues.lock().await;
            queues.uploads.drain(..).collect()
        };
        if pending.is_empty() {
            return;
        }

        debug!(count = pending.len(), "Draining upload queue");
        let listener = self.listener.read().await.clone();

        for request in pending {
            for backend in &self.backends {
                match backend.put(&request.path, &request.object).await {
                    Ok(()) => {
                        info!(
                            backend = backend.name(),
                            path = %request.path.display(),
                            object = %request.object,
                            modtime = ?request.modtime,
                            "Upload confirmed"
                        );
                        if let Some(listener) = &listener {
                            if let Err(e) = listener
                                .upload_success(&request.path, &request.object, backend.remote_id())
                                .await
                            {
                                error!(
                                    path = %request.path.display(),
                                    error = %e,
                                    "Upload-completion callback failed"
                                );
                            }
                        }
                    }
                    Err(e) => {
                        // retry policy belongs to the backend; here the
                        // failure is logged and the request dropped
                        warn!(
                            backend = backend.name(),
                            path = %request.path.display(),
                            object = %request.object,
                            error = %e,
                            "Upload failed"
                        );
                    }
                }
            }
        }
    }

    async fn drain_deletes(&self) {
        let pending: Vec<String> = {
            let mut queues = self.queues.lock().await;
            queues.deletes.drain(..).collect()
        };
        if pending.is_empty() {
            return;
        }

        debug!(count = pending.len(), "Draining delete queue");
        for object in pending {
            for backend in &self.backends {
                if let Err(e) = backend.delete(&object).await {
                    warn!(
                        backend = backend.name(),
                        object = %object,
                        error = %e,
                        "Remote delete failed"
                    );
                }
            }
        }
    }

    /// Destination a download request resolves to: the explicit target (or
    /// the configured download dir) with the watched path's own directory
    /// structure recreated beneath it.
    fn destination(&self, request: &DownloadRequest) -> PathBuf {
        let base = request
            .target
            .clone()
            .unwrap_or_else(|| self.download_dir.clone());
        let relative = request
            .path
            .strip_prefix("/")
            .unwrap_or(request.path.as_path());
        base.join(relative)
    }
}

#[async_trait::async_trait]
impl IReplicationQueue for ReplicationCoordinator {
    async fn enqueue_upload(&self, path: &Path, object: &str, modtime: Option<i64>) {
        let mut queues = self.queues.lock().await;
        queues.uploads.push_back(UploadRequest {
            path: path.to_path_buf(),
            object: object.to_string(),
            modtime,
        });
        debug!(path = %path.display(), object, ?modtime, "Upload queued");
    }

    async fn enqueue_download(&self, request: DownloadRequest) {
        let mut queues = self.queues.lock().await;
        debug!(path = %request.path.display(), object = %request.object, "Download queued");
        queues.downloads.push_back(request);
    }

    async fn enqueue_delete(&self, object: &str) -> bool {
        if self.backends.is_empty() {
            return false;
        }
        let mut queues = self.queues.lock().await;
        queues.deletes.push_back(object.to_string());
        debug!(object, "Delete queued");
        true
    }

    async fn upload_now(&self, path: &Path, object: &str) -> anyhow::Result<String> {
        if self.backends.is_empty() {
            anyhow::bail!("no replication backends registered");
        }

        let mut report = String::new();
        for backend in &self.backends {
            match backend.put(path, object).await {
                Ok(()) => {
                    let _ = writeln!(
                        report,
                        "{}: uploaded {} as {}",
                        backend.name(),
                        path.display(),
                        object
                    );
                }
                Err(e) => {
                    // surfaced as text; the caller reopens its store either way
                    warn!(backend = backend.name(), object, error = %e, "Synchronous upload failed");
                    let _ = writeln!(
                        report,
                        "{}: upload of {} as {} failed: {e}",
                        backend.name(),
                        path.display(),
                        object
                    );
                }
            }
        }
        Ok(report)
    }

    async fn drain_downloads(&self) -> anyhow::Result<String> {
        let pending: Vec<DownloadRequest> = {
            let mut queues = self.queues.lock().await;
            queues.downloads.drain(..).collect()
        };

        if pending.is_empty() {
            return Ok("download queue is empty".to_string());
        }

        let mut report = String::new();
        for request in pending {
            let dest = self.destination(&request);
            let mut delivered = false;
            for backend in &self.backends {
                match backend.get(&request.object, &dest).await {
                    Ok(()) => {
                        let _ = writeln!(
                            report,
                            "downloaded {} to {}",
                            request.object,
                            dest.display()
                        );
                        delivered = true;
                        break;
                    }
                    Err(e) => {
                        warn!(
                            backend = backend.name(),
                            object = %request.object,
                            error = %e,
                            "Download failed"
                        );
                    }
                }
            }
            if !delivered {
                let _ = writeln!(report, "download of {} failed", request.object);
            }
        }
        Ok(report)
    }

    async fn list_objects(&self) -> anyhow::Result<Vec<String>> {
        let mut all = Vec::new();
        for backend in &self.backends {
            let mut objects = backend.list().await?;
            all.append(&mut objects);
        }
        all.sort();
        all.dedup();
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FsObjectStore;

    fn coordinator(dir: &tempfile::TempDir) -> ReplicationCoordinator {
        let backend = Arc::new(FsObjectStore::new(dir.path().join("objects"), 1));
        ReplicationCoordinator::new(vec![backend], dir.path().join("restore"))
    }

    #[tokio::test]
    async fn test_enqueue_delete_without_backends() {
        let coordinator = ReplicationCoordinator::new(Vec::new(), PathBuf::from("/tmp"));
        assert!(!coordinator.enqueue_delete("obj").await);
    }

    #[tokio::test]
    async fn test_upload_drain_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(&dir);

        let source = dir.path().join("watched.txt");
        tokio::fs::write(&source, b"contents").await.unwrap();

        coordinator.enqueue_upload(&source, "obj-a", Some(100)).await;
        coordinator.drain_uploads().await;
        assert_eq!(coordinator.list_objects().await.unwrap(), vec!["obj-a"]);

        assert!(coordinator.enqueue_delete("obj-a").await);
        coordinator.drain_deletes().await;
        assert!(coordinator.list_objects().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_download_recreates_structure_under_target() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(&dir);

        let source = dir.path().join("file.txt");
        tokio::fs::write(&source, b"v1").await.unwrap();
        coordinator.enqueue_upload(&source, "obj-b", None).await;
        coordinator.drain_uploads().await;

        let target = dir.path().join("out");
        coordinator
            .enqueue_download(DownloadRequest {
                path: PathBuf::from("/deep/nested/file.txt"),
                object: "obj-b".to_string(),
                modtime: None,
                target: Some(target.clone()),
            })
            .await;

        let report = coordinator.drain_downloads().await.unwrap();
        assert!(report.contains("downloaded obj-b"));

        let landed = target.join("deep/nested/file.txt");
        assert_eq!(tokio::fs::read(&landed).await.unwrap(), b"v1");
    }

    #[tokio::test]
    async fn test_drain_downloads_empty_queue() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(&dir);
        let report = coordinator.drain_downloads().await.unwrap();
        assert_eq!(report, "download queue is empty");
    }

    #[tokio::test]
    async fn test_upload_now_reports_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(&dir);

        let source = dir.path().join("index.db");
        tokio::fs::write(&source, b"db-bytes").await.unwrap();

        let report = coordinator.upload_now(&source, "backup-slot").await.unwrap();
        assert!(report.contains("uploaded"));
        assert!(report.contains("backup-slot"));
        assert_eq!(
            coordinator.list_objects().await.unwrap(),
            vec!["backup-slot"]
        );
    }
}
