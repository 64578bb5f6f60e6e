//! `dashboard`, `dashboard_user` and `dashboard_usrgrp` rows.

use panorama_core::dashboard::{GroupShare, StoredDashboard, UserShare};
use panorama_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::object_id::DbObjectId;

#[derive(Debug, Clone, FromRow)]
pub struct Dashboard {
    pub id: DbId,
    pub name: String,
    pub user_id: Option<DbId>,
    pub private: Option<bool>,
    pub template_id: Option<DbObjectId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Dashboard> for StoredDashboard {
    fn from(row: Dashboard) -> Self {
        Self {
            id: row.id,
            name: row.name,
            user_id: row.user_id,
            private: row.private,
            template_id: row.template_id.map(Into::into),
        }
    }
}

/// A user share of one dashboard.
#[derive(Debug, Clone, Copy, FromRow, Serialize)]
pub struct DashboardUser {
    pub dashboard_id: DbId,
    pub user_id: DbId,
    pub permission: i16,
}

impl From<DashboardUser> for UserShare {
    fn from(row: DashboardUser) -> Self {
        Self {
            user_id: row.user_id,
            permission: row.permission,
        }
    }
}

/// A user-group share of one dashboard.
#[derive(Debug, Clone, Copy, FromRow, Serialize)]
pub struct DashboardUserGroup {
    pub dashboard_id: DbId,
    pub usrgrp_id: DbId,
    pub permission: i16,
}

impl From<DashboardUserGroup> for GroupShare {
    fn from(row: DashboardUserGroup) -> Self {
        Self {
            usrgrp_id: row.usrgrp_id,
            permission: row.permission,
        }
    }
}

/// Filter for listing visible dashboards.
#[derive(Debug, Clone, Default)]
pub struct DashboardFilter {
    pub dashboard_ids: Option<Vec<DbId>>,
    pub template_id: Option<panorama_core::object_id::ObjectId>,
}
