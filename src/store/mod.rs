// Credvault - Store Module
//
// SQLite persistence for credentials and their sharing grants. The service
// layer only sees the `CredentialStore` and `SharingLedger` traits.

mod db;
mod error;
mod query;
mod repository;
mod sharing;

pub use db::Database;
pub use error::StoreError;
pub use query::{CredentialQuery, PageRequest, Scope, SortField, SortOrder};
pub use repository::{CredentialStore, SqliteCredentialStore};
pub use sharing::{SharingLedger, SqliteSharingLedger};
