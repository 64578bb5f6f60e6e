pub mod audit;
pub mod dashboards;
pub mod health;
pub mod template_dashboards;
pub mod user;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /dashboards                                   list, create, update (PUT)
/// /dashboards/{id}                              get
/// /dashboards/delete                            delete batch (POST)
///
/// /template-dashboards                          list (?template_id=), create, update (PUT)
/// /template-dashboards/{id}                     get
/// /template-dashboards/delete                   delete batch (POST)
///
/// /user/widgets/{id}/refresh-rate               get, set (PUT)
///
/// /admin/audit-logs                             recent entries (super admin)
/// /admin/audit-logs/integrity-check             verify hash chain (super admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/dashboards", dashboards::router())
        .nest("/template-dashboards", template_dashboards::router())
        .nest("/user", user::router())
        .nest("/admin/audit-logs", audit::router())
}
