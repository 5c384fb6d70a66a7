//! Relational backend on SQLite
//!
//! A connection is opened per operation and dropped when it completes.

use crate::error::Result;
use crate::store::KeyValueStore;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed rule table
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open or create the database and its `rules` table
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Self::connect(&db_path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS rules (
                id INTEGER PRIMARY KEY,
                rule_string TEXT NOT NULL UNIQUE,
                ast TEXT NOT NULL
            );
            "#,
        )?;

        Ok(Self { db_path })
    }

    fn connect(path: &Path) -> Result<Connection> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }
}

impl KeyValueStore for SqliteStore {
    fn put(&self, key: &str, value: &str) -> Result<()> {
        let conn = Self::connect(&self.db_path)?;
        conn.execute(
            r#"
            INSERT INTO rules (rule_string, ast) VALUES (?1, ?2)
            ON CONFLICT(rule_string) DO UPDATE SET ast = excluded.ast
            "#,
            params![key, value],
        )?;

        debug!(db = %self.db_path.display(), rule = key, "rule row upserted");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = Self::connect(&self.db_path)?;
        let ast = conn
            .query_row(
                "SELECT ast FROM rules WHERE rule_string = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(ast)
    }
}
