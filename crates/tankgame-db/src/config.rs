use std::path::PathBuf;

use crate::sql::QueryStore;

const DEFAULT_DB_PATH: &str = "tankgame.db";

/// Where the database lives and where its SQL comes from.
#[derive(Debug, Clone, PartialEq)]
pub struct DbConfig {
    pub db_path: PathBuf,
    /// `None` uses the statements compiled into the crate.
    pub sql_dir: Option<PathBuf>,
}

impl DbConfig {
    /// Reads `TANKGAME_DB_PATH` and `TANKGAME_SQL_DIR`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup("TANKGAME_DB_PATH")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_DB_PATH.into());
        let sql_dir = lookup("TANKGAME_SQL_DIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Self {
            db_path: PathBuf::from(db_path),
            sql_dir,
        }
    }

    pub fn query_store(&self) -> QueryStore {
        match &self.sql_dir {
            Some(dir) => QueryStore::from_dir(dir),
            None => QueryStore::embedded(),
        }
    }
}
