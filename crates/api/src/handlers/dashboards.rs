//! Handlers for user dashboards, plus the request types and helpers the
//! template dashboard handlers share.
//!
//! Batch endpoints accept either one dashboard object or an array of them.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use panorama_core::dashboard::{DashboardInput, DashboardKind};
use panorama_core::types::DbId;
use panorama_db::models::dashboard::DashboardFilter;
use serde::{Deserialize, Serialize};

use crate::dashboards::DashboardService;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

const SERVICE: DashboardService = DashboardService::new(DashboardKind::User);

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// One item or a list of items.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Batch<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Batch<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Batch::Many(items) => items,
            Batch::One(item) => vec![item],
        }
    }
}

/// Body of the delete endpoints.
#[derive(Debug, Deserialize)]
pub struct DeleteDashboards {
    pub dashboard_ids: Vec<DbId>,
}

/// Ids affected by a batch call, in input order.
#[derive(Debug, Serialize)]
pub struct DashboardIds {
    pub dashboard_ids: Vec<DbId>,
}

// ---------------------------------------------------------------------------
// Shared bodies
// ---------------------------------------------------------------------------

pub(crate) async fn create_with(
    service: DashboardService,
    user: AuthUser,
    state: AppState,
    batch: Batch<DashboardInput>,
) -> AppResult<impl IntoResponse> {
    let dashboard_ids = service
        .create(&state.pool, &user.caller(), &batch.into_vec())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: DashboardIds { dashboard_ids },
        }),
    ))
}

pub(crate) async fn update_with(
    service: DashboardService,
    user: AuthUser,
    state: AppState,
    batch: Batch<DashboardInput>,
) -> AppResult<impl IntoResponse> {
    let dashboard_ids = service
        .update(&state.pool, &user.caller(), &batch.into_vec())
        .await?;
    Ok(Json(DataResponse {
        data: DashboardIds { dashboard_ids },
    }))
}

pub(crate) async fn delete_with(
    service: DashboardService,
    user: AuthUser,
    state: AppState,
    input: DeleteDashboards,
) -> AppResult<impl IntoResponse> {
    let dashboard_ids = service
        .delete(&state.pool, &user.caller(), &input.dashboard_ids)
        .await?;
    Ok(Json(DataResponse {
        data: DashboardIds { dashboard_ids },
    }))
}

pub(crate) async fn get_with(
    service: DashboardService,
    user: AuthUser,
    state: AppState,
    id: DbId,
) -> AppResult<impl IntoResponse> {
    let dashboard = service.get_one(&state.pool, &user.caller(), id).await?;
    Ok(Json(DataResponse { data: dashboard }))
}

// ---------------------------------------------------------------------------
// User dashboard endpoints
// ---------------------------------------------------------------------------

/// GET /api/v1/dashboards
pub async fn list_dashboards(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let dashboards = SERVICE
        .get(&state.pool, &user.caller(), &DashboardFilter::default())
        .await?;
    Ok(Json(DataResponse { data: dashboards }))
}

/// GET /api/v1/dashboards/{id}
pub async fn get_dashboard(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    get_with(SERVICE, user, state, id).await
}

/// POST /api/v1/dashboards
pub async fn create_dashboards(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(batch): Json<Batch<DashboardInput>>,
) -> AppResult<impl IntoResponse> {
    create_with(SERVICE, user, state, batch).await
}

/// PUT /api/v1/dashboards
pub async fn update_dashboards(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(batch): Json<Batch<DashboardInput>>,
) -> AppResult<impl IntoResponse> {
    update_with(SERVICE, user, state, batch).await
}

/// POST /api/v1/dashboards/delete
pub async fn delete_dashboards(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(input): Json<DeleteDashboards>,
) -> AppResult<impl IntoResponse> {
    delete_with(SERVICE, user, state, input).await
}
