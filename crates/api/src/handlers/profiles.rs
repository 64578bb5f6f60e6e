//! Handlers for per-user widget preferences.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use panorama_core::types::DbId;
use panorama_core::widget_sync::check_refresh_rate;
use panorama_db::repositories::ProfileRepo;
use serde::{Deserialize, Serialize};

use crate::dashboards::ensure_widget_visible;
use crate::error::AppResult;
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetRefreshRate {
    /// Seconds between refreshes; `0` disables refreshing.
    pub refresh_rate: i32,
}

#[derive(Debug, Serialize)]
pub struct RefreshRate {
    pub widget_id: DbId,
    /// `None` when the user never chose one.
    pub refresh_rate: Option<i32>,
}

/// GET /api/v1/user/widgets/{id}/refresh-rate
pub async fn get_refresh_rate(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(widget_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_widget_visible(&state.pool, &user.caller(), widget_id).await?;

    let mut conn = state.pool.acquire().await?;
    let refresh_rate = ProfileRepo::get_refresh_rate(&mut conn, user.user_id, widget_id).await?;

    Ok(Json(DataResponse {
        data: RefreshRate {
            widget_id,
            refresh_rate,
        },
    }))
}

/// PUT /api/v1/user/widgets/{id}/refresh-rate
pub async fn set_refresh_rate(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(widget_id): Path<DbId>,
    Json(input): Json<SetRefreshRate>,
) -> AppResult<impl IntoResponse> {
    check_refresh_rate(input.refresh_rate)?;
    ensure_widget_visible(&state.pool, &user.caller(), widget_id).await?;

    let mut conn = state.pool.acquire().await?;
    ProfileRepo::set_refresh_rate(&mut conn, user.user_id, widget_id, input.refresh_rate).await?;

    tracing::info!(
        user_id = user.user_id,
        widget_id,
        refresh_rate = input.refresh_rate,
        "Widget refresh rate updated"
    );

    Ok(Json(DataResponse {
        data: RefreshRate {
            widget_id,
            refresh_rate: Some(input.refresh_rate),
        },
    }))
}
