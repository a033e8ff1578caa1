// Credvault - Credential domain errors
//
// Every failure a service operation can report. Permission and lookup
// failures are separate variants so callers can tell "missing" from
// "forbidden" without inspecting message text.

use thiserror::Error;
use uuid::Uuid;

use crate::access::AccessDenied;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Invalid credential type: '{0}'")]
    InvalidCredentialType(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(#[from] AccessDenied),

    /// A required account name was blank.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Credential not found: {0}")]
    NotFound(String),

    /// A bulk delete stopped part-way. `deleted` stay deleted.
    #[error("Deleted {} credential(s) before failing on '{failed}': {source}", deleted.len())]
    PartialDelete {
        deleted: Vec<Uuid>,
        failed: String,
        source: Box<CredentialError>,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl CredentialError {
    pub fn not_found(id: impl ToString) -> Self {
        CredentialError::NotFound(id.to_string())
    }

    /// The per-credential failure behind a partial bulk delete, or `self`.
    pub fn root_cause(&self) -> &CredentialError {
        match self {
            CredentialError::PartialDelete { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

