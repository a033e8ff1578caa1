// Credvault - Permission guard
//
// Ownership check applied before every single-record read or mutation.
// Admin accounts bypass ownership. Authentication of the actor happens
// upstream; this module only trusts what it is handed.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Account class as resolved by the account store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Admin,
    #[default]
    User,
}

/// The authenticated account a request runs as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    #[serde(default)]
    pub kind: AccountKind,
}

impl Actor {
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: AccountKind::User,
        }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: AccountKind::Admin,
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.kind == AccountKind::Admin
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AccountKind::Admin => write!(f, "{} (admin)", self.id),
            AccountKind::User => f.write_str(&self.id),
        }
    }
}

/// The actor is neither the owner nor privileged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("account '{actor}' may not act on a credential owned by '{owner}'")]
pub struct AccessDenied {
    pub actor: String,
    pub owner: String,
}

/// Allow when the actor owns the resource or is an admin.
pub fn authorize(actor: &Actor, owner: &str) -> Result<(), AccessDenied> {
    if actor.is_privileged() || actor.id == owner {
        return Ok(());
    }

    tracing::warn!(actor = %actor.id, owner = %owner, "Credential access denied");
    Err(AccessDenied {
        actor: actor.id.clone(),
        owner: owner.to_string(),
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
