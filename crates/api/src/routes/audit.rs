//! Audit trail routes (super admin only).

use axum::routing::get;
use axum::Router;

use crate::handlers::audit;
use crate::state::AppState;

/// Routes mounted at `/admin/audit-logs`.
///
/// ```text
/// GET /                   -> list_audit_logs
/// GET /integrity-check    -> check_integrity
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(audit::list_audit_logs))
        .route("/integrity-check", get(audit::check_integrity))
}
