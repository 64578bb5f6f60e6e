//! Handlers for the dashboard audit trail. Super admin only.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use panorama_core::audit::{entry_payload, verify_chain};
use panorama_db::models::audit::AuditQuery;
use panorama_db::repositories::AuditLogRepo;
use serde_json::Value;

use crate::error::AppResult;
use crate::middleware::rbac::RequireSuperAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/admin/audit-logs
///
/// Most recent entries first. Filters: `resource`, `resource_id`, `limit`.
pub async fn list_audit_logs(
    RequireSuperAdmin(_admin): RequireSuperAdmin,
    State(state): State<AppState>,
    Query(params): Query<AuditQuery>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.pool.acquire().await?;
    let entries = AuditLogRepo::list_recent(&mut conn, &params).await?;
    Ok(Json(DataResponse { data: entries }))
}

/// GET /api/v1/admin/audit-logs/integrity-check
///
/// Recompute the hash chain over every stored entry.
pub async fn check_integrity(
    RequireSuperAdmin(_admin): RequireSuperAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.pool.acquire().await?;
    let entries = AuditLogRepo::list_chain(&mut conn).await?;

    let result = verify_chain(entries.iter().map(|e| {
        let details = e.details_json.clone().unwrap_or(Value::Null);
        let payload = entry_payload(e.user_id, &e.action, &e.resource, e.resource_id, &details);
        (e.id, payload, e.integrity_hash.as_str())
    }));

    if let Some(id) = result.first_break {
        tracing::warn!(entry_id = id, verified = result.verified, "Audit chain broken");
    }

    Ok(Json(DataResponse { data: result }))
}
