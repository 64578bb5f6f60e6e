//! Route definitions for template dashboards.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::template_dashboards as handlers;
use crate::state::AppState;

/// Routes mounted at `/template-dashboards`.
///
/// ```text
/// GET    /          -> list_template_dashboards
/// POST   /          -> create_template_dashboards
/// PUT    /          -> update_template_dashboards
/// POST   /delete    -> delete_template_dashboards
/// GET    /{id}      -> get_template_dashboard
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_template_dashboards)
                .post(handlers::create_template_dashboards)
                .put(handlers::update_template_dashboards),
        )
        .route("/delete", post(handlers::delete_template_dashboards))
        .route("/{id}", get(handlers::get_template_dashboard))
}
