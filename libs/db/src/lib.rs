//! Database handle shared by the server and the access-requests module.
//!
//! Wraps one sqlx pool (PostgreSQL or SQLite, picked from the DSN scheme) and
//! exposes it both as raw sqlx and as a SeaORM `DatabaseConnection`.
//!
//! # Example
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> db::Result<()> {
//!     use db::{ConnectOpts, DbHandle};
//!     use sea_orm::{ConnectionTrait, Statement, DatabaseBackend};
//!
//!     let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default()).await?;
//!     db.sea()
//!         .execute(Statement::from_string(DatabaseBackend::Sqlite, "SELECT 1"))
//!         .await?;
//!     db.close().await;
//!     Ok(())
//! }
//! ```

use std::time::Duration;

#[cfg(feature = "pg")]
use sqlx::{postgres::PgPoolOptions, PgPool};
#[cfg(feature = "sqlite")]
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};

use sea_orm::DatabaseConnection;
#[cfg(feature = "pg")]
use sea_orm::SqlxPostgresConnector;
#[cfg(feature = "sqlite")]
use sea_orm::SqlxSqliteConnector;

use thiserror::Error;

/// Library-local result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Typed error for the DB handle.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Unknown DSN: {0}")]
    UnknownDsn(String),

    #[error("Feature not enabled: {0}")]
    FeatureDisabled(&'static str),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Sea(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Supported engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbEngine {
    Postgres,
    Sqlite,
}

/// Pool options; each driver applies the subset it supports.
#[derive(Clone, Debug)]
pub struct ConnectOpts {
    /// Maximum number of connections in the pool.
    pub max_conns: Option<u32>,
    /// Timeout to acquire a connection from the pool.
    pub acquire_timeout: Option<Duration>,
    /// Idle timeout before a connection is closed.
    pub idle_timeout: Option<Duration>,
    /// SQLite busy timeout; bounds how long a writer waits for the write lock.
    pub sqlite_busy_timeout: Option<Duration>,
    /// For SQLite file DSNs, create parent directories if missing.
    pub create_sqlite_dirs: bool,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            max_conns: Some(10),
            acquire_timeout: Some(Duration::from_secs(30)),
            idle_timeout: None,
            sqlite_busy_timeout: Some(Duration::from_millis(5_000)),
            create_sqlite_dirs: true,
        }
    }
}

/// One concrete sqlx pool.
#[derive(Clone)]
enum DbPool {
    #[cfg(feature = "pg")]
    Postgres(PgPool),
    #[cfg(feature = "sqlite")]
    Sqlite(SqlitePool),
}

/// Main handle. Cheap to share behind an `Arc`.
pub struct DbHandle {
    engine: DbEngine,
    pool: DbPool,
    sea: DatabaseConnection,
}

impl DbHandle {
    /// Detect engine by DSN scheme.
    pub fn detect(dsn: &str) -> Result<DbEngine> {
        let s = dsn.trim_start();
        if s.starts_with("postgres://") || s.starts_with("postgresql://") {
            Ok(DbEngine::Postgres)
        } else if s.starts_with("sqlite:") {
            Ok(DbEngine::Sqlite)
        } else {
            Err(DbError::UnknownDsn(dsn.to_string()))
        }
    }

    /// Connect and build handle.
    pub async fn connect(dsn: &str, opts: ConnectOpts) -> Result<Self> {
        let engine = Self::detect(dsn)?;
        tracing::debug!(?engine, "opening database pool");
        match engine {
            #[cfg(feature = "pg")]
            DbEngine::Postgres => {
                let mut o = PgPoolOptions::new();
                if let Some(n) = opts.max_conns {
                    o = o.max_connections(n);
                }
                if let Some(t) = opts.acquire_timeout {
                    o = o.acquire_timeout(t);
                }
                o = o.idle_timeout(opts.idle_timeout);
                let pool = o.connect(dsn).await?;
                let sea = SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone());
                Ok(Self {
                    engine,
                    pool: DbPool::Postgres(pool),
                    sea,
                })
            }
            #[cfg(feature = "sqlite")]
            DbEngine::Sqlite => {
                let in_memory = is_sqlite_memory(dsn);
                if opts.create_sqlite_dirs && !in_memory {
                    prepare_sqlite_dirs(dsn)?;
                }

                let mut options: SqliteConnectOptions = dsn.parse()?;
                options = options.create_if_missing(true);
                if !in_memory {
                    options = options
                        .journal_mode(SqliteJournalMode::Wal)
                        .synchronous(SqliteSynchronous::Normal);
                }
                if let Some(busy) = opts.sqlite_busy_timeout {
                    options = options.busy_timeout(busy);
                }

                let mut o = SqlitePoolOptions::new();
                if in_memory {
                    // The database lives only as long as its connection: pin exactly one.
                    o = o
                        .max_connections(1)
                        .min_connections(1)
                        .idle_timeout(None)
                        .max_lifetime(None);
                } else {
                    if let Some(n) = opts.max_conns {
                        o = o.max_connections(n);
                    }
                    o = o.idle_timeout(opts.idle_timeout);
                }
                if let Some(t) = opts.acquire_timeout {
                    o = o.acquire_timeout(t);
                }

                let pool = o.connect_with(options).await?;
                let sea = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool.clone());
                Ok(Self {
                    engine,
                    pool: DbPool::Sqlite(pool),
                    sea,
                })
            }
            #[cfg(not(feature = "pg"))]
            DbEngine::Postgres => Err(DbError::FeatureDisabled("PostgreSQL feature not enabled")),
            #[cfg(not(feature = "sqlite"))]
            DbEngine::Sqlite => Err(DbError::FeatureDisabled("SQLite feature not enabled")),
        }
    }

    /// Graceful pool close.
    pub async fn close(self) {
        match self.pool {
            #[cfg(feature = "pg")]
            DbPool::Postgres(p) => p.close().await,
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(p) => p.close().await,
        }
    }

    /// Get the backend.
    pub fn engine(&self) -> DbEngine {
        self.engine
    }

    /// Get SeaORM connection (clone; cheap handle).
    pub fn sea(&self) -> DatabaseConnection {
        self.sea.clone()
    }
}

// ===================== helpers =====================

#[cfg(feature = "sqlite")]
fn is_sqlite_memory(dsn: &str) -> bool {
    dsn.contains(":memory:") || dsn.contains("mode=memory")
}

/// Create the parent directory of a plain-path SQLite DSN.
#[cfg(feature = "sqlite")]
fn prepare_sqlite_dirs(dsn: &str) -> Result<()> {
    let raw = dsn
        .strip_prefix("sqlite://")
        .or_else(|| dsn.strip_prefix("sqlite:"))
        .unwrap_or(dsn);
    let path = raw.split_once('?').map(|(p, _)| p).unwrap_or(raw);
    if path.starts_with("file:") {
        return Ok(());
    }
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

// ===================== tests =====================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_backend_detection() {
        assert_eq!(
            DbHandle::detect("sqlite://test.db").unwrap(),
            DbEngine::Sqlite
        );
        assert_eq!(
            DbHandle::detect("sqlite::memory:").unwrap(),
            DbEngine::Sqlite
        );
        assert_eq!(
            DbHandle::detect("postgres://localhost/test").unwrap(),
            DbEngine::Postgres
        );
        assert!(DbHandle::detect("mysql://localhost/test").is_err());
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_sqlite_memory_connection() -> Result<()> {
        let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default()).await?;
        assert_eq!(db.engine(), DbEngine::Sqlite);
        db.close().await;
        Ok(())
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_sqlite_file_creates_parent_dirs() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("nested/dir/app.db");
        let dsn = format!("sqlite://{}", path.to_string_lossy().replace('\\', "/"));

        let db = DbHandle::connect(&dsn, ConnectOpts::default()).await?;
        assert!(path.parent().unwrap().exists());

        use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
        db.sea()
            .execute(Statement::from_string(
                DatabaseBackend::Sqlite,
                "CREATE TABLE probe (id INTEGER PRIMARY KEY)",
            ))
            .await?;
        db.close().await;
        assert!(path.exists());
        Ok(())
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_memory_dsn_detection() {
        assert!(is_sqlite_memory("sqlite::memory:"));
        assert!(is_sqlite_memory("sqlite:file:memdb1?mode=memory&cache=shared"));
        assert!(!is_sqlite_memory("sqlite://data/app.db"));
    }
}
