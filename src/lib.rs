// Credvault - Library root
//
// Re-exports the credential model, access guard, store, service, CLI, and
// gateway modules.

pub mod access;
pub mod cli;
pub mod config;
pub mod credential;
pub mod error;
pub mod gateway;
pub mod service;
pub mod store;

pub use error::{CredvaultError, Result};
