use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::SourceRegistry;
use crate::domain::value_objects::{SourceId, SourceKind, SourceLocator};

/// Table layout of one namespace
struct Namespace {
    table: &'static str,
    id_column: &'static str,
    locator_column: &'static str,
}

fn namespace(kind: SourceKind) -> Namespace {
    match kind {
        SourceKind::Camera => Namespace {
            table: "cameras",
            id_column: "camera_id",
            locator_column: "rtsp_url",
        },
        SourceKind::VideoFile => Namespace {
            table: "videos",
            id_column: "video_id",
            locator_column: "video_path",
        },
    }
}

fn storage_error(e: rusqlite::Error) -> DomainError {
    DomainError::Storage(e.to_string())
}

/// SQLite-backed registry. Statements run on the blocking pool, one at a
/// time behind the connection mutex.
pub struct SqliteSourceRegistry {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSourceRegistry {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path).map_err(storage_error)?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage_error)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        Self::ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn ensure_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cameras (
              camera_id INTEGER PRIMARY KEY,
              rtsp_url TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS videos (
              video_id INTEGER PRIMARY KEY,
              video_path TEXT NOT NULL
            );
            "#,
        )
        .map_err(storage_error)
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await
        .map_err(|e| DomainError::Storage(format!("registry task failed: {}", e)))?
    }
}

#[async_trait]
impl SourceRegistry for SqliteSourceRegistry {
    async fn add(&self, kind: SourceKind, id: SourceId, locator: SourceLocator) -> Result<()> {
        self.with_conn(move |conn| {
            let ns = namespace(kind);
            let sql = format!(
                "INSERT INTO {} ({}, {}) VALUES (?1, ?2)",
                ns.table, ns.id_column, ns.locator_column
            );

            // The primary key makes the existence check part of the insert
            match conn.execute(&sql, params![id.value(), locator.as_str()]) {
                Ok(_) => Ok(()),
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    Err(DomainError::Duplicate { kind, id })
                }
                Err(e) => Err(storage_error(e)),
            }
        })
        .await
    }

    async fn locate(&self, kind: SourceKind, id: SourceId) -> Result<SourceLocator> {
        self.with_conn(move |conn| {
            let ns = namespace(kind);
            let sql = format!(
                "SELECT {} FROM {} WHERE {} = ?1",
                ns.locator_column, ns.table, ns.id_column
            );

            let stored: Option<String> = conn
                .query_row(&sql, params![id.value()], |row| row.get(0))
                .optional()
                .map_err(storage_error)?;

            let stored = stored.ok_or(DomainError::NotFound { kind, id })?;
            SourceLocator::new(stored)
                .map_err(|e| DomainError::Storage(format!("corrupt {} row {}: {}", ns.table, id, e)))
        })
        .await
    }

    async fn remove(&self, kind: SourceKind, id: SourceId) -> Result<()> {
        self.with_conn(move |conn| {
            let ns = namespace(kind);
            let sql = format!("DELETE FROM {} WHERE {} = ?1", ns.table, ns.id_column);

            let deleted = conn.execute(&sql, params![id.value()]).map_err(storage_error)?;
            if deleted == 0 {
                return Err(DomainError::NotFound { kind, id });
            }
            Ok(())
        })
        .await
    }

    async fn count(&self, kind: SourceKind) -> Result<u64> {
        self.with_conn(move |conn| {
            let sql = format!("SELECT COUNT(*) FROM {}", namespace(kind).table);
            conn.query_row(&sql, [], |row| row.get::<_, i64>(0))
                .map(|n| n as u64)
                .map_err(storage_error)
        })
        .await
    }
}
