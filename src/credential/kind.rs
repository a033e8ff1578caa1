// Credvault - Credential kinds and their secret payloads
//
// A credential is either a username/password pair (`custom`) or a
// username/private-key/passphrase triple (`private-key`). The field set is
// carried by the enum variant itself, so an inactive field cannot hold a
// value. The `"-"` sentinel only exists at the wire/storage edge.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use super::CredentialError;

/// Wire placeholder for "field not applicable to this credential type".
pub const SENTINEL: &str = "-";

/// The declared type of a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialKind {
    #[serde(rename = "custom")]
    Custom,
    #[serde(rename = "private-key")]
    PrivateKey,
}

impl CredentialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::Custom => "custom",
            CredentialKind::PrivateKey => "private-key",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialKind {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "custom" => Ok(CredentialKind::Custom),
            "private-key" => Ok(CredentialKind::PrivateKey),
            other => Err(CredentialError::InvalidCredentialType(other.to_string())),
        }
    }
}

/// The four credential fields in their flat wire form.
///
/// This is what callers submit and what storage persists. `kind` stays a raw
/// string so that unknown types reach the normalizer and are rejected there
/// rather than failing at deserialization.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialFields {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub private_key: String,
    #[serde(default)]
    pub passphrase: String,
}

impl fmt::Debug for CredentialFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialFields")
            .field("kind", &self.kind)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("private_key", &"[REDACTED]")
            .field("passphrase", &"[REDACTED]")
            .finish()
    }
}

impl Drop for CredentialFields {
    fn drop(&mut self) {
        self.password.zeroize();
        self.private_key.zeroize();
        self.passphrase.zeroize();
    }
}

/// Secret material of a credential, keyed on its kind.
///
/// `None` means "not supplied"; it is rendered as the sentinel on the wire.
/// Secret strings are wiped from memory when the value is dropped.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSecret {
    Custom {
        username: Option<String>,
        password: Option<String>,
    },
    PrivateKey {
        username: Option<String>,
        private_key: Option<String>,
        passphrase: Option<String>,
    },
}

impl CredentialSecret {
    pub fn kind(&self) -> CredentialKind {
        match self {
            CredentialSecret::Custom { .. } => CredentialKind::Custom,
            CredentialSecret::PrivateKey { .. } => CredentialKind::PrivateKey,
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            CredentialSecret::Custom { username, .. }
            | CredentialSecret::PrivateKey { username, .. } => username.as_deref(),
        }
    }

    /// Render the flat wire shape, filling every inactive or missing field
    /// with the sentinel.
    pub fn fields(&self) -> CredentialFields {
        fn wire(value: &Option<String>) -> String {
            value.clone().unwrap_or_else(|| SENTINEL.to_string())
        }

        match self {
            CredentialSecret::Custom { username, password } => CredentialFields {
                kind: CredentialKind::Custom.as_str().to_string(),
                username: wire(username),
                password: wire(password),
                private_key: SENTINEL.to_string(),
                passphrase: SENTINEL.to_string(),
            },
            CredentialSecret::PrivateKey {
                username,
                private_key,
                passphrase,
            } => CredentialFields {
                kind: CredentialKind::PrivateKey.as_str().to_string(),
                username: wire(username),
                password: SENTINEL.to_string(),
                private_key: wire(private_key),
                passphrase: wire(passphrase),
            },
        }
    }
}

impl Zeroize for CredentialSecret {
    fn zeroize(&mut self) {
        match self {
            CredentialSecret::Custom { username, password } => {
                username.zeroize();
                password.zeroize();
            }
            CredentialSecret::PrivateKey {
                username,
                private_key,
                passphrase,
            } => {
                username.zeroize();
                private_key.zeroize();
                passphrase.zeroize();
            }
        }
    }
}

impl Drop for CredentialSecret {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// Custom Debug implementation that never reveals secret values.
impl fmt::Debug for CredentialSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mask(value: &Option<String>) -> &'static str {
            if value.is_some() {
                "[REDACTED]"
            } else {
                SENTINEL
            }
        }

        match self {
            CredentialSecret::Custom { username, password } => f
                .debug_struct("Custom")
                .field("username", username)
                .field("password", &mask(password))
                .finish(),
            CredentialSecret::PrivateKey {
                username,
                private_key,
                passphrase,
            } => f
                .debug_struct("PrivateKey")
                .field("username", username)
                .field("private_key", &mask(private_key))
                .field("passphrase", &mask(passphrase))
                .finish(),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
