//! Repository for the `audit_log` table.

use panorama_core::types::DbId;
use sqlx::PgConnection;

use crate::models::audit::{AuditLog, AuditQuery, CreateAuditLog};

/// Column list for `audit_log` SELECT queries.
const COLUMNS: &str = "\
    id, created_at, user_id, action, resource, resource_id, \
    resource_name, details_json, integrity_hash";

/// Advisory lock key serializing writers of the hash chain.
const CHAIN_LOCK_KEY: i64 = 0x5041_4e4f_5241_4d41;

/// Provides append and query operations for the audit log.
pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Take the transaction-scoped chain lock and return the hash of the
    /// latest entry. The lock is released on commit or rollback.
    pub async fn lock_chain_head(conn: &mut PgConnection) -> Result<Option<String>, sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(CHAIN_LOCK_KEY)
            .execute(&mut *conn)
            .await?;

        sqlx::query_scalar::<_, String>(
            "SELECT integrity_hash FROM audit_log ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&mut *conn)
        .await
    }

    /// Insert entries in order, returning their ids.
    pub async fn batch_insert(
        conn: &mut PgConnection,
        entries: &[CreateAuditLog],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            let id = sqlx::query_scalar::<_, DbId>(
                "INSERT INTO audit_log (user_id, action, resource, resource_id, resource_name, \
                 details_json, integrity_hash) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
            )
            .bind(entry.user_id)
            .bind(&entry.action)
            .bind(&entry.resource)
            .bind(entry.resource_id)
            .bind(&entry.resource_name)
            .bind(&entry.details_json)
            .bind(&entry.integrity_hash)
            .fetch_one(&mut *conn)
            .await?;
            ids.push(id);
        }
        Ok(ids)
    }

    /// Most recent entries first, optionally filtered by resource.
    pub async fn list_recent(
        conn: &mut PgConnection,
        params: &AuditQuery,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        let limit = params.limit.unwrap_or(50).clamp(1, 500);
        let query = format!(
            "SELECT {COLUMNS} FROM audit_log \
             WHERE ($1::text IS NULL OR resource = $1) \
             AND ($2::bigint IS NULL OR resource_id = $2) \
             ORDER BY id DESC LIMIT $3"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(params.resource.as_deref())
            .bind(params.resource_id)
            .bind(limit)
            .fetch_all(&mut *conn)
            .await
    }

    /// All entries in id order, for verifying the hash chain.
    pub async fn list_chain(conn: &mut PgConnection) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM audit_log ORDER BY id ASC");
        sqlx::query_as::<_, AuditLog>(&query)
            .fetch_all(&mut *conn)
            .await
    }
}
