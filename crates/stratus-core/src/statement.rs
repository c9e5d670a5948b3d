//! Durable-store statement model
//!
//! Mutations against the index tables are not executed one by one: the watch
//! engine buffers [`IndexStatement`]s in memory and flushes the whole queue
//! as a single batch on its own cadence (and at shutdown). This bounds write
//! amplification during bursts of change detection.
//!
//! Inserts use `INSERT OR IGNORE` so replaying a statement for a row that
//! already exists is not an error; flag and timestamp changes are targeted
//! `UPDATE ... WHERE` statements.

use crate::domain::PathHash;

/// Escape a string literal for embedding in a SQL statement.
fn sql_quote(value: &str) -> String {
    value.replace('\'', "''")
}

fn sql_bool(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// One buffered mutation against the durable index store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexStatement {
    /// Register a watched directory
    InsertDir { path: String, recursive: bool },
    /// Remove a watched directory
    DeleteDir { path: String },
    /// Record a new file version row
    InsertFileVersion {
        path: String,
        modtime: i64,
        path_hash: PathHash,
        file_hash: String,
        local_exists: bool,
    },
    /// Flip `local_exists` off for one specific version row
    MarkLocalMissing { path: String, modtime: i64 },
    /// Flip `remote_exists` on for every row carrying this path hash
    MarkRemoteExists { path_hash: PathHash },
    /// Remove every version row of a path
    DeleteFile { path: String },
    /// Create the singleton backup-metadata row
    InsertBackupMeta {
        store_path: String,
        object_name: String,
        modtime: i64,
    },
    /// Record the store file's modification time after a backup cycle
    UpdateBackupModtime { modtime: i64 },
}

impl IndexStatement {
    /// Render to a single terminated SQL statement.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::InsertDir { path, recursive } => format!(
                "INSERT OR IGNORE INTO dir_index (path, recursive) VALUES ('{}', {});",
                sql_quote(path),
                sql_bool(*recursive)
            ),
            Self::DeleteDir { path } => {
                format!("DELETE FROM dir_index WHERE path = '{}';", sql_quote(path))
            }
            Self::InsertFileVersion {
                path,
                modtime,
                path_hash,
                file_hash,
                local_exists,
            } => format!(
                "INSERT OR IGNORE INTO file_index \
                 (path, modtime, path_hash, file_hash, local_exists, remote_exists) \
                 VALUES ('{}', {}, '{}', '{}', {}, 0);",
                sql_quote(path),
                modtime,
                path_hash,
                sql_quote(file_hash),
                sql_bool(*local_exists)
            ),
            Self::MarkLocalMissing { path, modtime } => format!(
                "UPDATE file_index SET local_exists = 0 WHERE path = '{}' AND modtime = {};",
                sql_quote(path),
                modtime
            ),
            Self::MarkRemoteExists { path_hash } => format!(
                "UPDATE file_index SET remote_exists = 1 WHERE path_hash = '{path_hash}';"
            ),
            Self::DeleteFile { path } => {
                format!("DELETE FROM file_index WHERE path = '{}';", sql_quote(path))
            }
            Self::InsertBackupMeta {
                store_path,
                object_name,
                modtime,
            } => format!(
                "INSERT OR IGNORE INTO backup_meta (store_path, object_name, modtime) \
                 VALUES ('{}', '{}', {});",
                sql_quote(store_path),
                sql_quote(object_name),
                modtime
            ),
            Self::UpdateBackupModtime { modtime } => {
                format!("UPDATE backup_meta SET modtime = {modtime};")
            }
        }
    }

    /// Render a batch of statements into one executable SQL string.
    #[must_use]
    pub fn render_batch(statements: &[IndexStatement]) -> String {
        let mut sql = String::new();
        for statement in statements {
            sql.push_str(&statement.to_sql());
            sql.push('\n');
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash() -> PathHash {
        PathHash::new("a".repeat(64)).unwrap()
    }

    #[test]
    fn test_insert_dir_sql() {
        let sql = IndexStatement::InsertDir {
            path: "/watched/dir".to_string(),
            recursive: true,
        }
        .to_sql();
        assert_eq!(
            sql,
            "INSERT OR IGNORE INTO dir_index (path, recursive) VALUES ('/watched/dir', 1);"
        );
    }

    #[test]
    fn test_quote_escaping() {
        let sql = IndexStatement::DeleteDir {
            path: "/it's/a/dir".to_string(),
        }
        .to_sql();
        assert!(sql.contains("'/it''s/a/dir'"));
    }

    #[test]
    fn test_insert_file_version_sql() {
        let sql = IndexStatement::InsertFileVersion {
            path: "/f".to_string(),
            modtime: 1700000001,
            path_hash: hash(),
            file_hash: "b".repeat(64),
            local_exists: true,
        }
        .to_sql();
        assert!(sql.starts_with("INSERT OR IGNORE INTO file_index"));
        assert!(sql.contains("1700000001"));
        assert!(sql.ends_with("1, 0);"));
    }

    #[test]
    fn test_mark_local_missing_targets_one_version() {
        let sql = IndexStatement::MarkLocalMissing {
            path: "/f".to_string(),
            modtime: 7,
        }
        .to_sql();
        assert!(sql.contains("WHERE path = '/f' AND modtime = 7"));
    }

    #[test]
    fn test_mark_remote_exists_keyed_by_hash() {
        let sql = IndexStatement::MarkRemoteExists { path_hash: hash() }.to_sql();
        assert!(sql.contains(&format!("path_hash = '{}'", "a".repeat(64))));
    }

    #[test]
    fn test_render_batch_joins_statements() {
        let batch = vec![
            IndexStatement::InsertDir {
                path: "/d".to_string(),
                recursive: false,
            },
            IndexStatement::DeleteDir {
                path: "/d".to_string(),
            },
        ];
        let sql = IndexStatement::render_batch(&batch);
        assert_eq!(sql.lines().count(), 2);
        assert!(sql.lines().all(|line| line.ends_with(';')));
    }
}
