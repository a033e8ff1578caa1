// Credvault - Query contract for scoped listing and paged search
//
// The store only needs to know which credentials are visible, how to filter
// by name, how to sort, and which window to return. Parsing of the raw
// request parameters is lenient: anything malformed falls back to a default
// instead of failing the request.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which credentials a listing may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every credential (admin accounts).
    All,
    /// Credentials owned by `account` plus those shared with it.
    Accessible { account: String, shared: Vec<Uuid> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Name,
    #[default]
    Created,
}

impl SortField {
    /// `"name"` sorts by name; anything else sorts by creation time.
    pub fn from_param(raw: &str) -> Self {
        match raw.trim() {
            "name" => SortField::Name,
            _ => SortField::Created,
        }
    }

    pub(crate) fn column(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Created => "created",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascend,
    #[default]
    Descend,
}

impl SortOrder {
    /// `"ascend"` sorts ascending; anything else sorts descending.
    pub fn from_param(raw: &str) -> Self {
        match raw.trim() {
            "ascend" => SortOrder::Ascend,
            _ => SortOrder::Descend,
        }
    }

    pub(crate) fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Ascend => "ASC",
            SortOrder::Descend => "DESC",
        }
    }
}

/// A paged search request as a caller expresses it.
///
/// `page_index` is 1-based; 0 means the first page. `page_size` 0 means the
/// configured default.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageRequest {
    pub page_index: u32,
    pub page_size: u32,
    pub name: String,
    pub order: SortOrder,
    pub field: SortField,
}

impl PageRequest {
    /// Build a request from raw query-string values.
    pub fn from_params(page_index: &str, page_size: &str, name: &str, order: &str, field: &str) -> Self {
        Self {
            page_index: lenient_u32(page_index),
            page_size: lenient_u32(page_size),
            name: name.trim().to_string(),
            order: SortOrder::from_param(order),
            field: SortField::from_param(field),
        }
    }

    /// Resolve defaults and turn the request into a store query.
    pub fn into_query(self, scope: Scope, default_page_size: u32) -> CredentialQuery {
        let limit = match self.page_size {
            0 => default_page_size.max(1),
            size => size,
        };
        let page = self.page_index.max(1);

        CredentialQuery {
            scope,
            name: self.name,
            field: self.field,
            order: self.order,
            offset: u64::from(page - 1) * u64::from(limit),
            limit: u64::from(limit),
        }
    }
}

/// Malformed, negative, or missing numbers are treated as zero.
fn lenient_u32(raw: &str) -> u32 {
    raw.trim().parse().unwrap_or(0)
}

/// A fully resolved paged query the store executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialQuery {
    pub scope: Scope,
    pub name: String,
    pub field: SortField,
    pub order: SortOrder,
    pub offset: u64,
    pub limit: u64,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
