// Credvault - Top-level error types
//
// Aggregates errors from the credential, store, and config modules into a
// single error enum for the application boundary.

use thiserror::Error;

/// Top-level error type for all Credvault operations.
#[derive(Debug, Error)]
pub enum CredvaultError {
    #[error(transparent)]
    Credential(#[from] crate::credential::CredentialError),

    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CredvaultError>;
