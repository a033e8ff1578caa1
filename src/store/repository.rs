// Credvault - Credential Store Repository
//
// Persistence boundary for credential records. Rows keep the flat wire
// shape (four string columns with the "-" sentinel); conversion to the typed
// `Credential` happens on read and re-validates the declared type.

use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::credential::{
    Credential, CredentialFields, CredentialRecord, CredentialSecret, CredentialSummary, Page,
};

use super::db::{decode_time, decode_uuid, encode_time, Database};
use super::query::{CredentialQuery, Scope};
use super::StoreError;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over credential storage operations.
pub trait CredentialStore {
    /// Insert a new, already normalized credential.
    fn create(&self, credential: &Credential) -> Result<(), StoreError>;

    /// Fetch a credential with its secret fields.
    fn find_by_id(&self, id: &Uuid) -> Result<Option<Credential>, StoreError>;

    /// Every credential visible under `scope`, in insertion order.
    fn find_all(&self, scope: &Scope) -> Result<Vec<Credential>, StoreError>;

    /// One page of summaries plus the total number of matches.
    fn find_page(&self, query: &CredentialQuery) -> Result<Page<CredentialSummary>, StoreError>;

    /// Replace name and secret fields. Returns false if the id is unknown.
    fn update_by_id(&self, id: &Uuid, name: &str, secret: &CredentialSecret) -> Result<bool, StoreError>;

    /// Reassign ownership only. Returns false if the id is unknown.
    fn update_owner(&self, id: &Uuid, owner: &str) -> Result<bool, StoreError>;

    /// Delete a credential. Returns false if the id is unknown.
    fn delete_by_id(&self, id: &Uuid) -> Result<bool, StoreError>;

    /// Run `work` as one unit: either all of its writes land or none do.
    ///
    /// Stores without transactions run `work` directly.
    fn atomically<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<StoreError>,
    {
        work()
    }
}

// ─── SQLite Implementation ──────────────────────────────────────────────────

const CREDENTIAL_COLUMNS: &str =
    "id, name, type, username, password, private_key, passphrase, owner, created";

/// Rows visible to a scope, optionally narrowed by a name substring.
/// ?1 = account (NULL for all), ?2 = JSON array of shared ids, ?3 = name
/// filter escaped with `like_escape` (ASCII case-insensitive substring).
const SCOPED_FILTER: &str = "(?1 IS NULL OR owner = ?1 OR id IN (SELECT value FROM json_each(?2)))
      AND (?3 = '' OR name LIKE '%' || ?3 || '%' ESCAPE '\\')";

/// Make `LIKE` wildcards in a user-supplied filter match literally.
fn like_escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub struct SqliteCredentialStore<'a> {
    db: &'a Database,
}

impl<'a> SqliteCredentialStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Parse a credential row into its flat record.
    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<CredentialRecord> {
        let id: String = row.get(0)?;
        let created: String = row.get(8)?;

        Ok(CredentialRecord {
            id: decode_uuid(0, &id)?,
            name: row.get(1)?,
            fields: CredentialFields {
                kind: row.get(2)?,
                username: row.get(3)?,
                password: row.get(4)?,
                private_key: row.get(5)?,
                passphrase: row.get(6)?,
            },
            owner: row.get(7)?,
            created: decode_time(8, &created)?,
        })
    }

    fn record_to_credential(record: CredentialRecord) -> Result<Credential, StoreError> {
        let id = record.id;
        Credential::try_from(record).map_err(|e| StoreError::Corrupt {
            id: id.to_string(),
            reason: e.to_string(),
        })
    }

    /// Bind values for `SCOPED_FILTER`.
    fn scope_params(scope: &Scope) -> Result<(Option<String>, String), StoreError> {
        match scope {
            Scope::All => Ok((None, "[]".to_string())),
            Scope::Accessible { account, shared } => {
                Ok((Some(account.clone()), serde_json::to_string(shared)?))
            }
        }
    }
}

impl<'a> CredentialStore for SqliteCredentialStore<'a> {
    fn create(&self, credential: &Credential) -> Result<(), StoreError> {
        let fields = credential.secret.fields();

        self.db.conn().execute(
            "INSERT INTO credentials
                (id, name, type, username, password, private_key, passphrase, owner, created)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                credential.id.to_string(),
                credential.name,
                fields.kind,
                fields.username,
                fields.password,
                fields.private_key,
                fields.passphrase,
                credential.owner,
                encode_time(&credential.created),
            ],
        )?;

        tracing::info!(
            credential_id = %credential.id,
            kind = %credential.kind(),
            owner = %credential.owner,
            "Credential stored"
        );

        Ok(())
    }

    fn find_by_id(&self, id: &Uuid) -> Result<Option<Credential>, StoreError> {
        let record = self
            .db
            .conn()
            .query_row(
                &format!("SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE id = ?1"),
                params![id.to_string()],
                Self::row_to_record,
            )
            .optional()?;

        record.map(Self::record_to_credential).transpose()
    }

    fn find_all(&self, scope: &Scope) -> Result<Vec<Credential>, StoreError> {
        let (account, shared) = Self::scope_params(scope)?;
        let mut stmt = self.db.conn().prepare(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM credentials
             WHERE {SCOPED_FILTER}
             ORDER BY rowid ASC"
        ))?;

        let rows = stmt.query_map(params![account, shared, ""], Self::row_to_record)?;

        let mut credentials = Vec::new();
        for row in rows {
            credentials.push(Self::record_to_credential(row?)?);
        }

        Ok(credentials)
    }

    fn find_page(&self, query: &CredentialQuery) -> Result<Page<CredentialSummary>, StoreError> {
        let (account, shared) = Self::scope_params(&query.scope)?;
        let name = like_escape(&query.name);
        let conn = self.db.conn();

        let total: i64 = conn.query_row(
            &format!("SELECT count(*) FROM credentials WHERE {SCOPED_FILTER}"),
            params![account, shared, name],
            |row| row.get(0),
        )?;

        let direction = query.order.keyword();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM credentials
             WHERE {SCOPED_FILTER}
             ORDER BY {column} {direction}, rowid {direction}
             LIMIT ?4 OFFSET ?5",
            column = query.field.column(),
        ))?;

        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);
        let rows = stmt.query_map(
            params![account, shared, name, limit, offset],
            Self::row_to_record,
        )?;

        let mut items = Vec::new();
        for row in rows {
            items.push(Self::record_to_credential(row?)?.summary());
        }

        Ok(Page {
            total: u64::try_from(total).unwrap_or(0),
            items,
        })
    }

    fn update_by_id(&self, id: &Uuid, name: &str, secret: &CredentialSecret) -> Result<bool, StoreError> {
        let fields = secret.fields();
        let affected = self.db.conn().execute(
            "UPDATE credentials
             SET name = ?2, type = ?3, username = ?4, password = ?5,
                 private_key = ?6, passphrase = ?7
             WHERE id = ?1",
            params![
                id.to_string(),
                name,
                fields.kind,
                fields.username,
                fields.password,
                fields.private_key,
                fields.passphrase,
            ],
        )?;

        if affected > 0 {
            tracing::info!(credential_id = %id, kind = %secret.kind(), "Credential updated");
        }

        Ok(affected > 0)
    }

    fn update_owner(&self, id: &Uuid, owner: &str) -> Result<bool, StoreError> {
        let affected = self.db.conn().execute(
            "UPDATE credentials SET owner = ?2 WHERE id = ?1",
            params![id.to_string(), owner],
        )?;

        if affected > 0 {
            tracing::info!(credential_id = %id, owner = %owner, "Credential owner changed");
        }

        Ok(affected > 0)
    }

    fn delete_by_id(&self, id: &Uuid) -> Result<bool, StoreError> {
        let affected = self.db.conn().execute(
            "DELETE FROM credentials WHERE id = ?1",
            params![id.to_string()],
        )?;

        if affected > 0 {
            tracing::info!(credential_id = %id, "Credential deleted");
        }

        Ok(affected > 0)
    }

    fn atomically<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<StoreError>,
    {
        let tx = self
            .db
            .conn()
            .unchecked_transaction()
            .map_err(StoreError::from)?;

        // Dropping `tx` on the error path rolls back.
        let value = work()?;
        tx.commit().map_err(StoreError::from)?;

        Ok(value)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
