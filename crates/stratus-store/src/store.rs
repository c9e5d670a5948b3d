//! SQLite implementation of the IIndexStore port
//!
//! ## Close/reopen
//!
//! The backup protocol uploads the store file itself. To guarantee the file
//! on disk is complete and quiescent during that upload, [`close`] drains
//! the connection pool (which checkpoints the WAL) before the transfer and
//! [`reopen`] reconnects afterwards. The pool therefore lives behind an
//! `Option` guarded by an async mutex; executing against a closed store is
//! a [`StoreError::Closed`].

use std::path::{Path, PathBuf};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tokio::sync::Mutex;
use tracing::{debug, info};

use stratus_core::ports::{BackupRow, DirRow, FileRow, IIndexStore};

use crate::StoreError;

/// SQLite-backed durable index store
pub struct SqliteIndexStore {
    path: PathBuf,
    pool: Mutex<Option<SqlitePool>>,
}

impl SqliteIndexStore {
    /// Open (creating if missing) the index store at `path` and run the
    /// schema migration.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::OpenFailed(format!(
                    "failed to create store directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let pool = Self::connect(path).await?;
        Self::run_migrations(&pool).await?;

        info!(path = %path.display(), "Index store opened");

        Ok(Self {
            path: path.to_path_buf(),
            pool: Mutex::new(Some(pool)),
        })
    }

    async fn connect(path: &Path) -> Result<SqlitePool, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5));

        SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| {
                StoreError::OpenFailed(format!("failed to connect at {}: {e}", path.display()))
            })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<(), StoreError> {
        let migration_sql = include_str!("migrations/20260214_initial.sql");
        sqlx::raw_sql(migration_sql)
            .execute(pool)
            .await
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
        debug!("Index store migrations completed");
        Ok(())
    }
}

#[async_trait::async_trait]
impl IIndexStore for SqliteIndexStore {
    async fn execute(&self, sql: &str) -> anyhow::Result<()> {
        let guard = self.pool.lock().await;
        let pool = guard.as_ref().ok_or(StoreError::Closed)?;
        sqlx::raw_sql(sql)
            .execute(pool)
            .await
            .map_err(|e| StoreError::ExecuteFailed(format!("{e} (sql: {sql})")))?;
        Ok(())
    }

    async fn all_dirs(&self) -> anyhow::Result<Vec<DirRow>> {
        let guard = self.pool.lock().await;
        let pool = guard.as_ref().ok_or(StoreError::Closed)?;
        let rows = sqlx::query("SELECT path, recursive FROM dir_index ORDER BY rowid")
            .fetch_all(pool)
            .await?;

        let mut dirs = Vec::with_capacity(rows.len());
        for row in rows {
            dirs.push(DirRow {
                path: row.get::<String, _>(0),
                recursive: row.get::<i64, _>(1) != 0,
            });
        }
        Ok(dirs)
    }

    async fn all_files(&self) -> anyhow::Result<Vec<FileRow>> {
        let guard = self.pool.lock().await;
        let pool = guard.as_ref().ok_or(StoreError::Closed)?;
        // rowid order preserves insertion order, which is what keeps each
        // path's version list oldest-first across restarts
        let rows = sqlx::query(
            "SELECT path, modtime, path_hash, file_hash, local_exists, remote_exists \
             FROM file_index ORDER BY rowid",
        )
        .fetch_all(pool)
        .await?;

        let mut files = Vec::with_capacity(rows.len());
        for row in rows {
            files.push(FileRow {
                path: row.get::<String, _>(0),
                modtime: row.get::<i64, _>(1),
                path_hash: row.get::<String, _>(2),
                file_hash: row.get::<String, _>(3),
                local_exists: row.get::<i64, _>(4) != 0,
                remote_exists: row.get::<i64, _>(5) != 0,
            });
        }
        Ok(files)
    }

    async fn backup_record(&self) -> anyhow::Result<Option<BackupRow>> {
        let guard = self.pool.lock().await;
        let pool = guard.as_ref().ok_or(StoreError::Closed)?;
        let row = sqlx::query("SELECT store_path, object_name, modtime FROM backup_meta LIMIT 1")
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|row| BackupRow {
            store_path: row.get::<String, _>(0),
            object_name: row.get::<String, _>(1),
            modtime: row.get::<i64, _>(2),
        }))
    }

    async fn close(&self) -> anyhow::Result<()> {
        let mut guard = self.pool.lock().await;
        if let Some(pool) = guard.take() {
            pool.close().await;
            debug!(path = %self.path.display(), "Index store closed");
        }
        Ok(())
    }

    async fn reopen(&self) -> anyhow::Result<()> {
        let mut guard = self.pool.lock().await;
        if guard.is_none() {
            *guard = Some(Self::connect(&self.path).await?);
            debug!(path = %self.path.display(), "Index store reopened");
        }
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}
