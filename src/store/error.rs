// Credvault - Store error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A persisted row could not be turned back into a credential or grant.
    #[error("Corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },
}
