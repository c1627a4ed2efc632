pub mod config;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod sql;

use anyhow::Result;
use rusqlite::Connection;
use std::borrow::Cow;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub use config::DbConfig;
pub use sql::QueryStore;

/// Email of the sentinel account used as the counterparty for platform
/// points grants and deductions.
pub const SYSTEM_ACCOUNT_EMAIL: &str = "localhost";

pub struct Database {
    conn: Mutex<Connection>,
    queries: QueryStore,
}

impl Database {
    pub fn open(path: &Path, queries: QueryStore) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let db = Self::init(conn, queries)?;
        info!("Database opened at {}", path.display());
        Ok(db)
    }

    pub fn open_with_config(config: &DbConfig) -> Result<Self> {
        Self::open(&config.db_path, config.query_store())
    }

    /// Fresh in-memory database with embedded queries, for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, QueryStore::embedded())
    }

    fn init(conn: Connection, queries: QueryStore) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            queries,
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }

    /// Exclusive access for work that opens a transaction.
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock().map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&mut *conn)
    }

    pub fn query(&self, name: &str) -> Result<Cow<'static, str>> {
        self.queries.load(name)
    }
}
