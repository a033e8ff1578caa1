// Credvault - Credential data models
//
// `Credential` is the typed in-process record. On the wire it serializes
// through `CredentialRecord`, the flat shape with the four string fields and
// the "-" sentinel, so existing clients keep working.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::kind::{CredentialFields, CredentialKind, CredentialSecret, SENTINEL};
use super::normalize::normalize;
use super::CredentialError;

/// A stored connection credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "CredentialRecord", try_from = "CredentialRecord")]
pub struct Credential {
    pub id: Uuid,
    pub name: String,
    pub owner: String,
    pub secret: CredentialSecret,
    pub created: DateTime<Utc>,
}

impl Credential {
    pub fn kind(&self) -> CredentialKind {
        self.secret.kind()
    }

    pub fn summary(&self) -> CredentialSummary {
        CredentialSummary {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind(),
            username: self.secret.username().unwrap_or(SENTINEL).to_string(),
            owner: self.owner.clone(),
            created: self.created,
        }
    }
}

/// Human-readable one-liner without any secret material.
impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}) owned by {}",
            self.id,
            self.name,
            self.kind(),
            self.owner
        )
    }
}

/// Flat wire/storage form of a credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub fields: CredentialFields,
    pub owner: String,
    pub created: DateTime<Utc>,
}

impl From<Credential> for CredentialRecord {
    fn from(credential: Credential) -> Self {
        let fields = credential.secret.fields();
        CredentialRecord {
            id: credential.id,
            name: credential.name,
            fields,
            owner: credential.owner,
            created: credential.created,
        }
    }
}

impl TryFrom<CredentialRecord> for Credential {
    type Error = CredentialError;

    fn try_from(record: CredentialRecord) -> Result<Self, Self::Error> {
        let secret = normalize(&record.fields)?;
        Ok(Credential {
            id: record.id,
            name: record.name,
            owner: record.owner,
            secret,
            created: record.created,
        })
    }
}

/// Caller-supplied payload for create and update.
///
/// The server assigns `id`, `owner` and `created`; anything the caller sends
/// for those is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialInput {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub fields: CredentialFields,
}

impl CredentialInput {
    pub fn new(name: impl Into<String>, fields: CredentialFields) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

/// Secret-free projection used by paged search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CredentialKind,
    pub username: String,
    pub owner: String,
    pub created: DateTime<Utc>,
}

/// Grant letting `grantee` use a credential it does not own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharingGrant {
    pub credential_id: Uuid,
    pub grantee: String,
    pub created: DateTime<Utc>,
}

/// One page of search results plus the unpaged total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub total: u64,
    pub items: Vec<T>,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
