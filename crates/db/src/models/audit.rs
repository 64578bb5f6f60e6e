//! Audit log rows. Entries are immutable once written.

use panorama_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLog {
    pub id: DbId,
    pub created_at: Timestamp,
    pub user_id: DbId,
    pub action: String,
    pub resource: String,
    pub resource_id: DbId,
    pub resource_name: String,
    pub details_json: Option<serde_json::Value>,
    pub integrity_hash: String,
}

/// An entry to insert; `integrity_hash` is already chained.
#[derive(Debug, Clone)]
pub struct CreateAuditLog {
    pub user_id: DbId,
    pub action: String,
    pub resource: String,
    pub resource_id: DbId,
    pub resource_name: String,
    pub details_json: serde_json::Value,
    pub integrity_hash: String,
}

/// Filter for listing recent entries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    pub resource: Option<String>,
    pub resource_id: Option<DbId>,
    pub limit: Option<i64>,
}
