//! SQLite-backed string-keyed JSON document store.
//!
//! The storefront core treats persistence as an external document store:
//! whole JSON collections read and written atomically under string keys
//! (`dm_{store}_orders`, `dm_{store}_clients`, ...). This module provides
//! that contract on rusqlite with WAL mode, schema migrations, and a
//! shared connection behind a mutex.

use rusqlite::{params, Connection};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{error, info, warn};

use crate::error::{Error, Result};

/// Shared state holding the database connection.
pub struct DbState {
    pub conn: Mutex<Connection>,
    pub db_path: PathBuf,
}

impl DbState {
    /// Lock the connection, mapping a poisoned mutex to a storage error.
    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Storage("connection mutex poisoned".into()))
    }
}

/// Current schema version. Bump when adding new migrations.
const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Initialize the database at `{data_dir}/storefront.db`.
///
/// Creates the directory if needed, opens the connection, sets pragmas,
/// and runs any pending migrations. On corruption or open failure,
/// deletes the file and retries once.
pub fn init(data_dir: &Path) -> Result<DbState> {
    fs::create_dir_all(data_dir).map_err(|e| Error::Storage(format!("create data dir: {e}")))?;

    let db_path = data_dir.join("storefront.db");
    info!("Opening database at {}", db_path.display());

    let conn = match open_and_configure(&db_path) {
        Ok(c) => c,
        Err(first_err) => {
            warn!(
                "Database open failed ({}), deleting and retrying once",
                first_err
            );
            if db_path.exists() {
                let _ = fs::remove_file(&db_path);
                // Also remove WAL/SHM files if present
                let _ = fs::remove_file(db_path.with_extension("db-wal"));
                let _ = fs::remove_file(db_path.with_extension("db-shm"));
            }
            open_and_configure(&db_path)
                .map_err(|e| Error::Storage(format!("open failed after retry: {e}")))?
        }
    };

    run_migrations(&conn)?;

    info!("Database initialized (schema v{CURRENT_SCHEMA_VERSION})");

    Ok(DbState {
        conn: Mutex::new(conn),
        db_path,
    })
}

/// Open the database file and apply pragmas.
fn open_and_configure(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path).map_err(|e| Error::Storage(format!("sqlite open: {e}")))?;

    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )
    .map_err(|e| Error::Storage(format!("pragma setup: {e}")))?;

    Ok(conn)
}

/// Run all pending migrations up to `CURRENT_SCHEMA_VERSION`.
fn run_migrations(conn: &Connection) -> Result<()> {
    // Ensure schema_version table exists first
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT DEFAULT (datetime('now'))
        );",
    )
    .map_err(|e| Error::Storage(format!("create schema_version: {e}")))?;

    let current: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current >= CURRENT_SCHEMA_VERSION {
        info!("Database schema up to date (v{current})");
        return Ok(());
    }

    info!("Migrating database from v{current} to v{CURRENT_SCHEMA_VERSION}");

    if current < 1 {
        migrate_v1(conn)?;
    }
    if current < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Migration v1: the documents table (whole-collection JSON per key).
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- documents (string key -> whole JSON document)
        CREATE TABLE IF NOT EXISTS documents (
            doc_key TEXT PRIMARY KEY,
            body TEXT NOT NULL,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now'))
        );

        -- Record migration
        INSERT INTO schema_version (version) VALUES (1);
        ",
    )
    .map_err(|e| {
        error!("Migration v1 failed: {e}");
        Error::Storage(format!("migration v1: {e}"))
    })?;

    info!("Applied migration v1 (documents table)");
    Ok(())
}

/// Migration v2: updated_at index for the operator dashboard's
/// "what changed since" scans.
fn migrate_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_documents_updated_at
            ON documents(updated_at);

        -- Record migration
        INSERT INTO schema_version (version) VALUES (2);
        ",
    )
    .map_err(|e| {
        error!("Migration v2 failed: {e}");
        Error::Storage(format!("migration v2: {e}"))
    })?;

    info!("Applied migration v2 (documents updated_at index)");
    Ok(())
}

// ---------------------------------------------------------------------------
// Document helpers
// ---------------------------------------------------------------------------

/// Get a single document body, if present.
pub fn get_document(conn: &Connection, key: &str) -> Option<String> {
    conn.query_row(
        "SELECT body FROM documents WHERE doc_key = ?1",
        params![key],
        |row| row.get(0),
    )
    .ok()
}

/// Insert or replace a whole document under `key`.
pub fn set_document(conn: &Connection, key: &str, body: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO documents (doc_key, body, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(doc_key) DO UPDATE SET
            body = excluded.body,
            updated_at = excluded.updated_at",
        params![key, body],
    )
    .map_err(|e| Error::Storage(format!("set_document: {e}")))?;
    Ok(())
}

/// Delete a document. Missing keys are not an error.
pub fn delete_document(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM documents WHERE doc_key = ?1", params![key])
        .map_err(|e| Error::Storage(format!("delete_document: {e}")))?;
    Ok(())
}

/// Open an in-memory store with migrations applied (test helper).
#[cfg(test)]
pub(crate) fn test_state() -> DbState {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )
    .expect("pragma setup");
    run_migrations(&conn).expect("run_migrations should succeed in test");
    DbState {
        conn: Mutex::new(conn),
        db_path: PathBuf::from(":memory:"),
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_create_documents_table() {
        let state = test_state();
        let conn = state.conn.lock().expect("lock");

        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='documents'",
                [],
                |row| row.get(0),
            )
            .expect("query sqlite_master");
        assert_eq!(count, 1, "documents table should exist");

        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })
            .expect("read schema version");
        assert_eq!(version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let state = test_state();
        let conn = state.conn.lock().expect("lock");
        // Running again should be a no-op (already at latest version)
        run_migrations(&conn).expect("second run should succeed");

        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })
            .expect("read schema version");
        assert_eq!(version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_set_document_replaces_whole_body() {
        let state = test_state();
        let conn = state.conn.lock().expect("lock");

        set_document(&conn, "dm_s1_orders", "[]").expect("first write");
        set_document(&conn, "dm_s1_orders", r#"[{"id":"1"}]"#).expect("second write");

        let body = get_document(&conn, "dm_s1_orders").expect("document present");
        assert_eq!(body, r#"[{"id":"1"}]"#);
    }

    #[test]
    fn test_get_missing_document_is_none() {
        let state = test_state();
        let conn = state.conn.lock().expect("lock");
        assert!(get_document(&conn, "dm_missing").is_none());
    }

    #[test]
    fn test_delete_document() {
        let state = test_state();
        let conn = state.conn.lock().expect("lock");

        set_document(&conn, "dm_session", "{}").expect("write");
        delete_document(&conn, "dm_session").expect("delete");
        assert!(get_document(&conn, "dm_session").is_none());

        // Deleting again is not an error
        delete_document(&conn, "dm_session").expect("delete missing");
    }

    #[test]
    fn test_wal_mode_on_file_db() {
        // WAL only works on file-backed databases; in-memory always returns "memory".
        let dir = std::env::temp_dir().join("digital_menu_pos_test_wal");
        let _ = std::fs::create_dir_all(&dir);
        let db_path = dir.join("test_wal.db");
        let _ = std::fs::remove_file(&db_path);

        let conn = open_and_configure(&db_path).expect("open temp db");
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .expect("read journal_mode");
        assert_eq!(mode.to_lowercase(), "wal", "journal_mode should be WAL");

        drop(conn);
        let _ = std::fs::remove_file(&db_path);
        let _ = std::fs::remove_file(db_path.with_extension("db-wal"));
        let _ = std::fs::remove_file(db_path.with_extension("db-shm"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
