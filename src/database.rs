use std::path::{Path, PathBuf};

use log::info;
use once_cell::sync::OnceCell;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension};

use crate::error::RosterError;
use crate::schema::{CREATE_SCHEMA_SQL, SCHEMA_VERSION};

const DB_FILENAME: &str = "roster.db";

static POOL: OnceCell<Pool<SqliteConnectionManager>> = OnceCell::new();

pub struct Database;

impl Database {
    /// Opens (creating if needed) the database in `db_dir` and installs the global pool.
    /// Calling this more than once keeps the first pool.
    pub fn init(db_dir: &Path, pool_size: u32) -> Result<PathBuf, RosterError> {
        if !db_dir.is_dir() {
            std::fs::create_dir_all(db_dir)?;
        }

        let db_path = db_dir.join(DB_FILENAME);
        let manager = SqliteConnectionManager::file(&db_path)
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder().max_size(pool_size.max(1)).build(manager)?;

        {
            let conn = pool.get()?;
            Self::ensure_schema(&conn)?;
        }

        if POOL.set(pool).is_err() {
            info!("Database pool already initialized; keeping existing pool");
        }

        info!("Database opened at: {}", db_path.display());
        Ok(db_path)
    }

    pub fn get_connection() -> Result<PooledConnection<SqliteConnectionManager>, RosterError> {
        let pool = POOL
            .get()
            .ok_or_else(|| RosterError::Error("Database has not been initialized".into()))?;
        Ok(pool.get()?)
    }

    /// Creates the schema on a fresh database, or checks the stored version on an existing one.
    pub fn ensure_schema(conn: &Connection) -> Result<(), RosterError> {
        let table_exists: bool = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='meta'",
                [],
                |row| row.get::<_, i32>(0),
            )
            .map(|count| count > 0)?;

        if !table_exists {
            conn.execute_batch(CREATE_SCHEMA_SQL)?;
            return Ok(());
        }

        let stored_version: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match stored_version.as_deref() {
            Some(SCHEMA_VERSION) => Ok(()),
            Some(other) => Err(RosterError::Error(format!(
                "Schema version mismatch: found {other}, expected {SCHEMA_VERSION}"
            ))),
            None => Err(RosterError::Error("Schema version missing".to_string())),
        }
    }

    /// In-memory database with the schema applied
    #[cfg(test)]
    pub fn open_in_memory() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        Self::ensure_schema(&conn).unwrap();
        conn
    }
}
