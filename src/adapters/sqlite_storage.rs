//! SQLite storage: one key/value row holds the serialized collection.

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use std::path::Path;

use crate::domain::error::KumoError;
use crate::ports::storage_port::{StoragePort, STORAGE_KEY};

pub struct SqliteStorage {
    pool: Pool<SqliteConnectionManager>,
}

fn db_error(e: impl std::fmt::Display) -> KumoError {
    KumoError::Database {
        reason: e.to_string(),
    }
}

impl SqliteStorage {
    pub fn open<P: AsRef<Path>>(path: P, pool_size: u32) -> Result<Self, KumoError> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(db_error)?;

        let storage = Self { pool };
        storage.initialize_schema()?;
        Ok(storage)
    }

    pub fn in_memory() -> Result<Self, KumoError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).map_err(db_error)?;

        let storage = Self { pool };
        storage.initialize_schema()?;
        Ok(storage)
    }

    fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>, KumoError> {
        self.pool.get().map_err(db_error)
    }

    fn initialize_schema(&self) -> Result<(), KumoError> {
        self.connection()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS kv_store (
                    key TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL
                );",
            )
            .map_err(db_error)
    }
}

impl StoragePort for SqliteStorage {
    fn read_all(&self) -> Result<Option<String>, KumoError> {
        let conn = self.connection()?;
        conn.query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            params![STORAGE_KEY],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e: rusqlite::Error| KumoError::StorageRead {
            reason: e.to_string(),
        })
    }

    fn write_all(&self, blob: &str) -> Result<(), KumoError> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![STORAGE_KEY, blob],
        )
        .map_err(|e: rusqlite::Error| KumoError::StorageWrite {
            reason: e.to_string(),
        })?;
        Ok(())
    }

    fn clear(&self) -> Result<(), KumoError> {
        let conn = self.connection()?;
        conn.execute("DELETE FROM kv_store WHERE key = ?1", params![STORAGE_KEY])
            .map_err(db_error)?;
        Ok(())
    }
}
