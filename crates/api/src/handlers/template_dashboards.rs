//! Handlers for dashboards attached to monitoring templates.
//!
//! Reads follow the caller's host-group permissions on the template;
//! writes additionally require the `admin` or `super_admin` role.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use panorama_core::dashboard::{DashboardInput, DashboardKind};
use panorama_core::object_id::ObjectId;
use panorama_core::types::DbId;
use panorama_db::models::dashboard::DashboardFilter;
use serde::Deserialize;

use super::dashboards::{
    create_with, delete_with, get_with, update_with, Batch, DeleteDashboards,
};
use crate::dashboards::DashboardService;
use crate::error::AppResult;
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

const SERVICE: DashboardService = DashboardService::new(DashboardKind::Template);

#[derive(Debug, Deserialize)]
pub struct TemplateDashboardParams {
    pub template_id: Option<ObjectId>,
}

/// GET /api/v1/template-dashboards?template_id=
pub async fn list_template_dashboards(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<TemplateDashboardParams>,
) -> AppResult<impl IntoResponse> {
    let filter = DashboardFilter {
        dashboard_ids: None,
        template_id: params.template_id,
    };
    let dashboards = SERVICE.get(&state.pool, &user.caller(), &filter).await?;
    Ok(Json(DataResponse { data: dashboards }))
}

/// GET /api/v1/template-dashboards/{id}
pub async fn get_template_dashboard(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    get_with(SERVICE, user, state, id).await
}

/// POST /api/v1/template-dashboards
pub async fn create_template_dashboards(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(batch): Json<Batch<DashboardInput>>,
) -> AppResult<impl IntoResponse> {
    create_with(SERVICE, user, state, batch).await
}

/// PUT /api/v1/template-dashboards
pub async fn update_template_dashboards(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(batch): Json<Batch<DashboardInput>>,
) -> AppResult<impl IntoResponse> {
    update_with(SERVICE, user, state, batch).await
}

/// POST /api/v1/template-dashboards/delete
pub async fn delete_template_dashboards(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(input): Json<DeleteDashboards>,
) -> AppResult<impl IntoResponse> {
    delete_with(SERVICE, user, state, input).await
}
