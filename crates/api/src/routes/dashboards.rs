//! Route definitions for user dashboards.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::dashboards;
use crate::state::AppState;

/// Routes mounted at `/dashboards`.
///
/// ```text
/// GET    /          -> list_dashboards
/// POST   /          -> create_dashboards
/// PUT    /          -> update_dashboards
/// POST   /delete    -> delete_dashboards
/// GET    /{id}      -> get_dashboard
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(dashboards::list_dashboards)
                .post(dashboards::create_dashboards)
                .put(dashboards::update_dashboards),
        )
        .route("/delete", post(dashboards::delete_dashboards))
        .route("/{id}", get(dashboards::get_dashboard))
}
