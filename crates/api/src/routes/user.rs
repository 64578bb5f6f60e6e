//! Per-user preference routes.

use axum::routing::get;
use axum::Router;

use crate::handlers::profiles;
use crate::state::AppState;

/// Routes mounted at `/user`.
///
/// ```text
/// GET /widgets/{id}/refresh-rate  -> get_refresh_rate
/// PUT /widgets/{id}/refresh-rate  -> set_refresh_rate
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/widgets/{id}/refresh-rate",
        get(profiles::get_refresh_rate).put(profiles::set_refresh_rate),
    )
}
