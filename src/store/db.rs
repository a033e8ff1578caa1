// Credvault - SQLite Database Management
//
// Opens the credential database and keeps its schema current. One
// `Database` wraps one connection; the credential store and the sharing
// ledger borrow the same connection so a single transaction can span both.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::Connection;
use uuid::Uuid;

use super::StoreError;

/// How long a writer waits on a lock held by another connection.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Wrapper around a SQLite connection with the credvault schema applied.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        let db = Self { conn };
        db.run_migrations()?;

        tracing::debug!(path = %path.display(), "Database opened");
        Ok(db)
    }

    /// Open a private in-memory database. Used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run schema migrations to create or update tables.
    fn run_migrations(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS credentials (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL DEFAULT '',
                type            TEXT NOT NULL,
                username        TEXT NOT NULL DEFAULT '-',
                password        TEXT NOT NULL DEFAULT '-',
                private_key     TEXT NOT NULL DEFAULT '-',
                passphrase      TEXT NOT NULL DEFAULT '-',
                owner           TEXT NOT NULL,
                created         TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sharing_grants (
                credential_id   TEXT NOT NULL,
                grantee         TEXT NOT NULL,
                created         TEXT NOT NULL,
                PRIMARY KEY (credential_id, grantee)
            );

            CREATE INDEX IF NOT EXISTS idx_credentials_owner
                ON credentials(owner);

            CREATE INDEX IF NOT EXISTS idx_sharing_grants_grantee
                ON sharing_grants(grantee);
            ",
        )?;

        tracing::debug!("Database migrations completed successfully");
        Ok(())
    }
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
pub(crate) fn encode_time(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_time(column: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

pub(crate) fn decode_uuid(column: usize, raw: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn table_exists(db: &Database, name: &str) -> bool {
        let count: i64 = db
            .conn()
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [name],
                |row| row.get(0),
            )
            .unwrap();
        count == 1
    }

    #[test]
    fn test_open_in_memory_succeeds() {
        let db = Database::open_in_memory();
        assert!(db.is_ok(), "Should be able to open an in-memory database");
    }

    #[test]
    fn test_schema_migration_creates_tables() {
        let db = Database::open_in_memory().unwrap();
        assert!(table_exists(&db, "credentials"), "credentials table should exist");
        assert!(table_exists(&db, "sharing_grants"), "sharing_grants table should exist");
    }

    #[test]
    fn test_schema_migration_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.run_migrations().is_ok(), "Migrations should be idempotent");
    }

    #[test]
    fn test_on_disk_database_persists_rows() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("credvault.db");

        {
            let db = Database::open(&db_path).unwrap();
            db.conn()
                .execute(
                    "INSERT INTO credentials (id, name, type, owner, created)
                     VALUES ('c1', 'web', 'custom', 'alice', '2024-01-01T00:00:00.000000Z')",
                    [],
                )
                .unwrap();
        }

        let db = Database::open(&db_path).unwrap();
        let owner: String = db
            .conn()
            .query_row("SELECT owner FROM credentials WHERE id = 'c1'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(owner, "alice");
    }

    #[test]
    fn test_inactive_columns_default_to_sentinel() {
        let db = Database::open_in_memory().unwrap();
        db.conn()
            .execute(
                "INSERT INTO credentials (id, type, owner, created)
                 VALUES ('c1', 'custom', 'alice', '2024-01-01T00:00:00.000000Z')",
                [],
            )
            .unwrap();

        let private_key: String = db
            .conn()
            .query_row("SELECT private_key FROM credentials", [], |row| row.get(0))
            .unwrap();
        assert_eq!(private_key, "-");
    }

    #[test]
    fn test_encoded_times_sort_chronologically() {
        let earlier = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let later = DateTime::parse_from_rfc3339("2024-01-01T00:00:00.5Z")
            .unwrap()
            .with_timezone(&Utc);

        assert!(encode_time(&earlier) < encode_time(&later));
        assert_eq!(decode_time(0, &encode_time(&later)).unwrap(), later);
    }
}
