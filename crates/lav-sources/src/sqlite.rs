//! [`ColumnStore`] backed by a SQLite file.
//!
//! Every wide table is stored as `(row_key, column_name, value BLOB)`. The
//! connection pool is opened on first use and shared afterwards; all SQLite
//! work runs on the blocking pool.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection};
use tokio::sync::OnceCell;
use tokio::task;
use tracing::{debug, error, info};

use lav_core::{Result, SourceSettings, ViewerError};

use crate::column::{ColumnStore, Row};

pub type DbPool = Pool<SqliteConnectionManager>;

const DEFAULT_MAX_CONNECTIONS: u32 = 4;

fn unavailable(reason: impl ToString) -> ViewerError {
    ViewerError::unavailable("sqlite", reason)
}

/// Table names come from tenant and server keys, so anything outside
/// `[A-Za-z0-9_]` is replaced before the name reaches SQL.
pub fn sanitize_table_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn create_table(conn: &Connection, table: &str) -> rusqlite::Result<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS \"{table}\" (
            row_key     TEXT NOT NULL,
            column_name TEXT NOT NULL,
            value       BLOB NOT NULL,
            PRIMARY KEY (row_key, column_name)
        )"
    ))
}

fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT count(*) FROM sqlite_master WHERE type='table' AND name=?",
        params![table],
        |row| row.get::<_, i64>(0).map(|count| count > 0),
    )
}

pub struct SqliteColumnStore {
    path: PathBuf,
    max_connections: u32,
    pool: OnceCell<DbPool>,
}

impl std::fmt::Debug for SqliteColumnStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteColumnStore")
            .field("path", &self.path)
            .field("max_connections", &self.max_connections)
            .field("open", &self.pool.initialized())
            .finish()
    }
}

impl SqliteColumnStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            pool: OnceCell::new(),
        }
    }

    /// Properties: `path` (required), `max_connections`.
    pub fn from_settings(settings: &SourceSettings) -> Result<Self> {
        let path = settings
            .property("path")
            .ok_or_else(|| unavailable("missing `path` property"))?;
        let mut store = Self::new(path);
        if let Some(max) = settings.property("max_connections") {
            store.max_connections = max
                .parse()
                .map_err(|e| unavailable(format!("max_connections {max:?}: {e}")))?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn pool(&self) -> Result<&DbPool> {
        self.pool
            .get_or_try_init(|| async {
                let path = self.path.clone();
                let max_connections = self.max_connections.max(1);
                task::spawn_blocking(move || open_pool(&path, max_connections))
                    .await
                    .map_err(|e| ViewerError::TaskFailed(e.to_string()))?
            })
            .await
    }

    /// Run `f` with a pooled connection on the blocking pool.
    async fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool().await?.clone();
        task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(unavailable)?;
            f(&mut *conn).map_err(|e| {
                error!(error = %e, "sqlite statement failed");
                unavailable(e)
            })
        })
        .await
        .map_err(|e| ViewerError::TaskFailed(e.to_string()))?
    }

    /// Insert or replace every column of `row` in `table`, creating the table
    /// if needed.
    pub async fn put_row(&self, table: &str, row: Row) -> Result<()> {
        self.put_rows(table, vec![row]).await
    }

    pub async fn put_rows(&self, table: &str, rows: Vec<Row>) -> Result<()> {
        let table = sanitize_table_name(table);
        let count = rows.len();
        self.with_connection(move |conn| {
            create_table(conn, &table)?;
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(&format!(
                    "INSERT OR REPLACE INTO \"{table}\" (row_key, column_name, value) VALUES (?1, ?2, ?3)"
                ))?;
                for row in &rows {
                    for (column, value) in &row.columns {
                        stmt.execute(params![row.key, column, &value[..]])?;
                    }
                }
            }
            tx.commit()
        })
        .await?;
        debug!(rows = count, "stored rows");
        Ok(())
    }
}

fn open_pool(path: &Path, max_connections: u32) -> Result<DbPool> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    info!(path = %path.display(), "opening sqlite column store");

    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )
    });
    Pool::builder()
        .max_size(max_connections)
        .build(manager)
        .map_err(|e| {
            error!(path = %path.display(), error = %e, "failed to create connection pool");
            unavailable(format!("failed to create connection pool: {e}"))
        })
}

#[async_trait]
impl ColumnStore for SqliteColumnStore {
    async fn table_exists(&self, table: &str) -> Result<bool> {
        let table = sanitize_table_name(table);
        self.with_connection(move |conn| table_exists(conn, &table)).await
    }

    async fn scan(&self, table: &str, columns: &[&str], limit: usize) -> Result<Vec<Row>> {
        let table = sanitize_table_name(table);
        let wanted: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.with_connection(move |conn| {
            if !table_exists(conn, &table)? {
                return Ok(Vec::new());
            }
            let mut stmt = conn.prepare(&format!(
                "SELECT row_key, column_name, value FROM \"{table}\"
                 WHERE row_key IN (SELECT DISTINCT row_key FROM \"{table}\" ORDER BY row_key LIMIT ?1)
                 ORDER BY row_key"
            ))?;
            let cells = stmt.query_map(params![limit], |r| {
                Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?, r.get::<_, Vec<u8>>(2)?))
            })?;

            let mut rows: Vec<Row> = Vec::new();
            for cell in cells {
                let (key, column, value) = cell?;
                if !wanted.is_empty() && !wanted.contains(&column) {
                    continue;
                }
                if rows.last().map_or(true, |last| last.key != key) {
                    rows.push(Row::new(key));
                }
                if let Some(last) = rows.last_mut() {
                    last.columns.insert(column, Bytes::from(value));
                }
            }
            Ok(rows)
        })
        .await
    }

    async fn count(&self, table: &str) -> Result<usize> {
        let table = sanitize_table_name(table);
        self.with_connection(move |conn| {
            if !table_exists(conn, &table)? {
                return Ok(0);
            }
            conn.query_row(&format!("SELECT COUNT(DISTINCT row_key) FROM \"{table}\""), [], |r| {
                r.get::<_, i64>(0)
            })
            .map(|n| n.max(0) as usize)
        })
        .await
    }
}
