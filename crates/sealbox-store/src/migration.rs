//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL
//! string that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    // Create migrations table if it doesn't exist
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    // Get current version
    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    // Apply migrations
    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Protected file artifacts
        CREATE TABLE artifacts (
            id BLOB PRIMARY KEY,              -- 16 bytes, random
            stored_filename TEXT NOT NULL,    -- protected artifact filename
            original_filename TEXT NOT NULL,  -- as uploaded
            path TEXT NOT NULL,               -- protected artifact path
            size INTEGER NOT NULL,            -- protected artifact byte size
            content_type TEXT NOT NULL,
            credential TEXT NOT NULL,         -- cleartext per-file password
            owner TEXT NOT NULL,
            created_at INTEGER NOT NULL,      -- Unix ms
            status INTEGER NOT NULL,          -- ArtifactStatus as u8
            protector INTEGER NOT NULL,       -- ProtectorKind as u8
            degraded INTEGER NOT NULL DEFAULT 0
        );

        -- Append-only download log. INSERT is the atomic append.
        CREATE TABLE downloads (
            artifact_id BLOB NOT NULL,
            requester TEXT,                   -- NULL for anonymous
            at INTEGER NOT NULL,              -- Unix ms
            location TEXT
        );

        -- Role reference table
        CREATE TABLE roles (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            is_system INTEGER NOT NULL DEFAULT 0,
            capability TEXT NOT NULL          -- JSON-encoded Capability
        );

        -- Module reference table
        CREATE TABLE modules (
            name TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1
        );

        -- Indexes for common queries
        CREATE INDEX idx_artifacts_owner ON artifacts(owner);
        CREATE INDEX idx_artifacts_created ON artifacts(created_at);
        CREATE INDEX idx_downloads_artifact ON downloads(artifact_id, at);
        "#,
    )?;

    Ok(())
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        // Verify tables exist
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"artifacts".to_string()));
        assert!(tables.contains(&"downloads".to_string()));
        assert!(tables.contains(&"roles".to_string()));
        assert!(tables.contains(&"modules".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));
    }

    #[test]
    fn test_migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap(); // Should not error
        migrate(&mut conn).unwrap(); // Still should not error

        // Verify version is 1
        let version: u32 = conn
            .query_row(
                "SELECT MAX(version) FROM schema_migrations",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(version, 1);
    }
}
