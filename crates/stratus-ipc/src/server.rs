//! Control socket server
//!
//! Accepts administrative connections on a unix domain socket and
//! translates requests into watch-engine calls. Every mutating command
//! returns a human-readable response string summarizing what happened;
//! failures become `error: ...` responses rather than dropped connections.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use stratus_core::ports::IReplicationQueue;
use stratus_watch::engine::format_modtime;
use stratus_watch::WatchEngine;

use crate::protocol::{Command, DELIMITER, MAX_REQUEST_LEN};

/// Unix-socket control server for the daemon
pub struct ControlServer {
    engine: Arc<WatchEngine>,
    replicator: Arc<dyn IReplicationQueue>,
    socket_path: PathBuf,
}

impl ControlServer {
    pub fn new(
        engine: Arc<WatchEngine>,
        replicator: Arc<dyn IReplicationQueue>,
        socket_path: PathBuf,
    ) -> Self {
        Self {
            engine,
            replicator,
            socket_path,
        }
    }

    /// Accept loop. Binds the socket (replacing a stale one from a previous
    /// run), serves one task per connection, and unlinks the socket on the
    /// way out.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) -> anyhow::Result<()> {
        let _ = std::fs::remove_file(&self.socket_path);
        let listener = UnixListener::bind(&self.socket_path).with_context(|| {
            format!("failed to bind control socket {}", self.socket_path.display())
        })?;
        info!(socket = %self.socket_path.display(), "Control socket listening");

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, _)) => {
                        let server = Arc::clone(&self);
                        tokio::spawn(async move {
                            if let Err(e) = server.handle(stream).await {
                                warn!(error = %e, "Control session failed");
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "Failed to accept control connection"),
                },
                _ = shutdown.cancelled() => {
                    info!("Shutdown signal received, closing control socket");
                    break;
                }
            }
        }

        let _ = std::fs::remove_file(&self.socket_path);
        Ok(())
    }

    async fn handle(&self, mut stream: UnixStream) -> anyhow::Result<()> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 256];
        loop {
            let read = stream.read(&mut chunk).await?;
            if read == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..read]);
            if buf.contains(&(DELIMITER as u8)) {
                break;
            }
            if buf.len() > MAX_REQUEST_LEN {
                anyhow::bail!("request exceeds {MAX_REQUEST_LEN} bytes");
            }
        }

        let raw = String::from_utf8_lossy(&buf);
        let request = raw.trim_end().trim_end_matches(DELIMITER).trim();
        debug!(request, "Control request received");

        let mut response = self.dispatch(request).await;
        response.push(DELIMITER);
        stream.write_all(response.as_bytes()).await?;
        stream.shutdown().await?;
        Ok(())
    }

    async fn dispatch(&self, request: &str) -> String {
        match Command::parse(request) {
            Err(e) => format!("error: {e}"),
            Ok(Command::AddWatch { path, recursive }) => {
                self.engine.add_watch(&path, recursive).await
            }
            Ok(Command::DelWatch { path }) => self.engine.del_watch(&path).await,
            Ok(Command::ListLocal) => self.engine.list_local().await,
            Ok(Command::ListRemote) => self.list_remote().await,
            Ok(Command::Download { target, selector }) => {
                self.engine
                    .download_files(&target, selector.as_deref())
                    .await
            }
        }
    }

    /// Proxy to the coordinator's object listing, resolving each object
    /// name back to a path/time pair through the reverse index.
    async fn list_remote(&self) -> String {
        let objects = match self.replicator.list_objects().await {
            Ok(objects) => objects,
            // listing may fail (credentials, transport); surfaced as text
            Err(e) => return format!("error: {e}"),
        };
        if objects.is_empty() {
            return "no remote objects".to_string();
        }

        let mut out = String::new();
        for object in objects {
            match self.engine.resolve_path_hash(&object).await {
                Ok((path, modtime)) => {
                    let _ = writeln!(out, "{} : {}", path.display(), format_modtime(modtime));
                }
                Err(_) if object == self.engine.backup_object() => {
                    let _ = writeln!(out, "{object} (index backup)");
                }
                Err(_) => {
                    let _ = writeln!(out, "{object} (unresolved)");
                }
            }
        }
        out
    }
}
