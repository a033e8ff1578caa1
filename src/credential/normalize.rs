// Credvault - Type normalization
//
// Turns a caller-supplied flat record into the typed secret for its declared
// kind. Fields that are inactive for the kind are discarded; empty active
// fields become "not supplied". Unknown kinds are rejected before anything
// touches storage.

use super::kind::{CredentialFields, CredentialKind, CredentialSecret, SENTINEL};
use super::CredentialError;

/// Normalize a raw record against its declared type.
pub fn normalize(fields: &CredentialFields) -> Result<CredentialSecret, CredentialError> {
    let kind: CredentialKind = fields.kind.parse()?;

    let secret = match kind {
        CredentialKind::Custom => CredentialSecret::Custom {
            username: active(&fields.username),
            password: active(&fields.password),
        },
        CredentialKind::PrivateKey => CredentialSecret::PrivateKey {
            username: active(&fields.username),
            private_key: active(&fields.private_key),
            passphrase: active(&fields.passphrase),
        },
    };

    Ok(secret)
}

fn active(value: &str) -> Option<String> {
    if value.is_empty() || value == SENTINEL {
        None
    } else {
        Some(value.to_string())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
