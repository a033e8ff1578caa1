// Credvault - Credential Module
//
// Credential kinds, the typed secret union, type normalization, and the
// domain error every service operation reports.

mod error;
mod kind;
mod models;
mod normalize;

pub use error::CredentialError;
pub use kind::{CredentialFields, CredentialKind, CredentialSecret, SENTINEL};
pub use models::{Credential, CredentialInput, CredentialRecord, CredentialSummary, Page, SharingGrant};
pub use normalize::normalize;
