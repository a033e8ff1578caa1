// Credvault - Sharing Ledger
//
// Grants that let accounts other than the owner use a credential. A grant
// only references its credential by id; whoever deletes a credential must
// purge its grants in the same unit of work.

use chrono::Utc;
use rusqlite::{params, Row};
use uuid::Uuid;

use crate::credential::SharingGrant;

use super::db::{decode_time, decode_uuid, encode_time, Database};
use super::StoreError;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over sharing grant storage.
pub trait SharingLedger {
    /// Record a grant. Returns false if the pair was already granted.
    fn grant(&self, credential_id: &Uuid, grantee: &str) -> Result<bool, StoreError>;

    /// All grants referencing a credential, oldest first.
    fn grants_for(&self, credential_id: &Uuid) -> Result<Vec<SharingGrant>, StoreError>;

    /// Ids of every credential shared with `grantee`.
    fn shared_with(&self, grantee: &str) -> Result<Vec<Uuid>, StoreError>;

    /// Remove every grant referencing a credential. Returns how many went.
    fn delete_by_credential(&self, credential_id: &Uuid) -> Result<usize, StoreError>;
}

// ─── SQLite Implementation ──────────────────────────────────────────────────

pub struct SqliteSharingLedger<'a> {
    db: &'a Database,
}

impl<'a> SqliteSharingLedger<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn row_to_grant(row: &Row<'_>) -> rusqlite::Result<SharingGrant> {
        let credential_id: String = row.get(0)?;
        let created: String = row.get(2)?;

        Ok(SharingGrant {
            credential_id: decode_uuid(0, &credential_id)?,
            grantee: row.get(1)?,
            created: decode_time(2, &created)?,
        })
    }
}

impl<'a> SharingLedger for SqliteSharingLedger<'a> {
    fn grant(&self, credential_id: &Uuid, grantee: &str) -> Result<bool, StoreError> {
        let affected = self.db.conn().execute(
            "INSERT OR IGNORE INTO sharing_grants (credential_id, grantee, created)
             VALUES (?1, ?2, ?3)",
            params![credential_id.to_string(), grantee, encode_time(&Utc::now())],
        )?;

        if affected > 0 {
            tracing::info!(credential_id = %credential_id, grantee = %grantee, "Credential shared");
        }

        Ok(affected > 0)
    }

    fn grants_for(&self, credential_id: &Uuid) -> Result<Vec<SharingGrant>, StoreError> {
        let mut stmt = self.db.conn().prepare(
            "SELECT credential_id, grantee, created FROM sharing_grants
             WHERE credential_id = ?1 ORDER BY created ASC, rowid ASC",
        )?;

        let rows = stmt.query_map(params![credential_id.to_string()], Self::row_to_grant)?;

        let mut grants = Vec::new();
        for row in rows {
            grants.push(row?);
        }

        Ok(grants)
    }

    fn shared_with(&self, grantee: &str) -> Result<Vec<Uuid>, StoreError> {
        let mut stmt = self
            .db
            .conn()
            .prepare("SELECT credential_id FROM sharing_grants WHERE grantee = ?1")?;

        let rows = stmt.query_map(params![grantee], |row| {
            let id: String = row.get(0)?;
            decode_uuid(0, &id)
        })?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }

        Ok(ids)
    }

    fn delete_by_credential(&self, credential_id: &Uuid) -> Result<usize, StoreError> {
        let purged = self.db.conn().execute(
            "DELETE FROM sharing_grants WHERE credential_id = ?1",
            params![credential_id.to_string()],
        )?;

        tracing::debug!(credential_id = %credential_id, purged, "Sharing grants purged");
        Ok(purged)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
