//! Dashboard variants, caller identity and dashboard-level validation.
//!
//! Two variants share one orchestrator: user dashboards (owned by a user,
//! optionally shared with users and user groups) and template dashboards
//! (attached to a monitoring template). [`DashboardKind`] carries every
//! difference the orchestrator needs to know about.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::audit::resources;
use crate::error::CoreError;
use crate::object_id::ObjectId;
use crate::roles::{ROLE_ADMIN, ROLE_SUPER_ADMIN};
use crate::types::DbId;
use crate::widget_field::WidgetFieldType;
use crate::widget_sync::{WidgetInput, WidgetRules};

/// Maximum length of a dashboard name.
pub const MAX_DASHBOARD_NAME_LEN: u64 = 255;

/// Permission levels used by `rights` and by dashboard shares.
pub const PERM_DENY: i16 = 0;
pub const PERM_READ: i16 = 2;
pub const PERM_READ_WRITE: i16 = 3;

/// Widget types available on user dashboards.
pub const USER_WIDGET_TYPES: &[&str] = &[
    "actionlog",
    "clock",
    "dataover",
    "discovery",
    "favgraphs",
    "favmaps",
    "graph",
    "graphprototype",
    "hostavail",
    "item",
    "map",
    "navtree",
    "plaintext",
    "problemhosts",
    "problems",
    "problemsbysv",
    "svggraph",
    "systeminfo",
    "trigover",
    "url",
    "web",
];

/// Widget types available on template dashboards.
pub const TEMPLATE_WIDGET_TYPES: &[&str] =
    &["clock", "graph", "graphprototype", "item", "plaintext", "url"];

/// Field types available on template dashboards. Host groups, hosts and
/// maps live outside a template and cannot be referenced from one.
pub const TEMPLATE_FIELD_TYPES: &[WidgetFieldType] = &[
    WidgetFieldType::Int,
    WidgetFieldType::Str,
    WidgetFieldType::Item,
    WidgetFieldType::ItemPrototype,
    WidgetFieldType::Graph,
    WidgetFieldType::GraphPrototype,
];

// ---------------------------------------------------------------------------
// Caller
// ---------------------------------------------------------------------------

/// The authenticated user a call runs on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: DbId,
    pub role: String,
}

impl Caller {
    pub fn is_super_admin(&self) -> bool {
        self.role == ROLE_SUPER_ADMIN
    }

    /// Admins and super admins may edit templates.
    pub fn can_edit_templates(&self) -> bool {
        self.role == ROLE_ADMIN || self.is_super_admin()
    }
}

// ---------------------------------------------------------------------------
// Variant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardKind {
    User,
    Template,
}

impl DashboardKind {
    pub fn widget_rules(self) -> WidgetRules {
        match self {
            Self::User => WidgetRules {
                widget_types: USER_WIDGET_TYPES,
                field_types: &WidgetFieldType::ALL,
            },
            Self::Template => WidgetRules {
                widget_types: TEMPLATE_WIDGET_TYPES,
                field_types: TEMPLATE_FIELD_TYPES,
            },
        }
    }

    pub fn audit_resource(self) -> &'static str {
        match self {
            Self::User => resources::DASHBOARD,
            Self::Template => resources::TEMPLATE_DASHBOARD,
        }
    }
}

// ---------------------------------------------------------------------------
// Input and stored shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserShare {
    pub user_id: DbId,
    pub permission: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct GroupShare {
    pub usrgrp_id: DbId,
    pub permission: i16,
}

/// A dashboard as submitted to create or update.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct DashboardInput {
    pub dashboard_id: Option<DbId>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub user_id: Option<DbId>,
    pub private: Option<bool>,
    pub template_id: Option<ObjectId>,
    pub users: Option<Vec<UserShare>>,
    pub user_groups: Option<Vec<GroupShare>>,
    pub widgets: Option<Vec<WidgetInput>>,
}

/// A `dashboard` row. User dashboards carry `user_id` and `private`,
/// template dashboards carry `template_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredDashboard {
    pub id: DbId,
    pub name: String,
    pub user_id: Option<DbId>,
    pub private: Option<bool>,
    pub template_id: Option<ObjectId>,
}

/// A dashboard row to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDashboard {
    pub name: String,
    pub user_id: Option<DbId>,
    pub private: Option<bool>,
    pub template_id: Option<ObjectId>,
}

/// Changed columns of a stored dashboard; `None` means unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardChanges {
    pub name: Option<String>,
    pub user_id: Option<DbId>,
    pub private: Option<bool>,
    pub template_id: Option<ObjectId>,
}

impl DashboardChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl DashboardInput {
    /// Check fields whose presence depends on the variant and on whether
    /// the dashboard is being created.
    pub fn validate_shape(&self, kind: DashboardKind, is_create: bool) -> Result<(), CoreError> {
        self.validate().map_err(|_| {
            CoreError::Validation(format!(
                "Invalid dashboard name: must be 1 to {MAX_DASHBOARD_NAME_LEN} characters long."
            ))
        })?;

        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(CoreError::Validation(
                    "Invalid dashboard name: cannot be empty.".to_string(),
                ));
            }
        }

        if is_create {
            if self.dashboard_id.is_some() {
                return Err(CoreError::Validation(
                    "Dashboard ID cannot be set on create.".to_string(),
                ));
            }
            if self.name.is_none() {
                return Err(CoreError::Validation(
                    "Dashboard name is required.".to_string(),
                ));
            }
            let widget_ids = self.widgets.iter().flatten().any(|w| w.widget_id.is_some());
            if widget_ids {
                return Err(CoreError::Validation(
                    "Widget ID cannot be set on create.".to_string(),
                ));
            }
        } else if self.dashboard_id.is_none() {
            return Err(CoreError::Validation(
                "Dashboard ID is required.".to_string(),
            ));
        }

        match kind {
            DashboardKind::User => {
                if self.template_id.is_some() {
                    return Err(CoreError::Validation(
                        "Template ID cannot be set on a user dashboard.".to_string(),
                    ));
                }
            }
            DashboardKind::Template => {
                let user_fields = self.user_id.is_some()
                    || self.private.is_some()
                    || self.users.is_some()
                    || self.user_groups.is_some();
                if user_fields {
                    return Err(CoreError::Validation(
                        "Owner, private flag and shares cannot be set on a template dashboard."
                            .to_string(),
                    ));
                }
                if is_create && self.template_id.is_none() {
                    return Err(CoreError::Validation(
                        "Template ID is required.".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Owner and share checks of user dashboards.
    pub fn validate_user_fields(&self, caller: &Caller) -> Result<(), CoreError> {
        if let Some(owner) = self.user_id {
            if owner != caller.user_id && !caller.is_super_admin() {
                return Err(CoreError::Forbidden(
                    "Only super admins can set dashboard owner.".to_string(),
                ));
            }
        }

        if let Some(users) = &self.users {
            check_share_permissions(users.iter().map(|s| s.permission))?;
            if let Some(dup) = first_duplicate(users.iter().map(|s| s.user_id)) {
                return Err(CoreError::Validation(format!(
                    "User with ID \"{dup}\" is shared more than once."
                )));
            }
        }

        if let Some(groups) = &self.user_groups {
            check_share_permissions(groups.iter().map(|s| s.permission))?;
            if let Some(dup) = first_duplicate(groups.iter().map(|s| s.usrgrp_id)) {
                return Err(CoreError::Validation(format!(
                    "User group with ID \"{dup}\" is shared more than once."
                )));
            }
        }

        Ok(())
    }

    /// The row to insert; owner defaults to the caller, `private` to `true`.
    pub fn to_new(&self, kind: DashboardKind, caller: &Caller) -> NewDashboard {
        let name = self.name.clone().unwrap_or_default();
        match kind {
            DashboardKind::User => NewDashboard {
                name,
                user_id: Some(self.user_id.unwrap_or(caller.user_id)),
                private: Some(self.private.unwrap_or(true)),
                template_id: None,
            },
            DashboardKind::Template => NewDashboard {
                name,
                user_id: None,
                private: None,
                template_id: self.template_id.clone(),
            },
        }
    }

    /// Columns that differ from `stored`.
    pub fn changes_from(&self, stored: &StoredDashboard) -> DashboardChanges {
        DashboardChanges {
            name: self.name.clone().filter(|n| *n != stored.name),
            user_id: self.user_id.filter(|u| Some(*u) != stored.user_id),
            private: self.private.filter(|p| Some(*p) != stored.private),
            template_id: self
                .template_id
                .clone()
                .filter(|t| Some(t) != stored.template_id.as_ref()),
        }
    }
}

fn check_share_permissions(permissions: impl Iterator<Item = i16>) -> Result<(), CoreError> {
    for permission in permissions {
        if permission != PERM_READ && permission != PERM_READ_WRITE {
            return Err(CoreError::Validation(format!(
                "Invalid share permission {permission}: must be {PERM_READ} or {PERM_READ_WRITE}."
            )));
        }
    }
    Ok(())
}

/// The first value that occurs more than once.
pub fn first_duplicate<T: Eq + Hash + Copy>(values: impl IntoIterator<Item = T>) -> Option<T> {
    let mut seen = HashSet::new();
    values.into_iter().find(|v| !seen.insert(*v))
}

/// Reject names repeated within one batch. `scoped` pairs each name with
/// the scope it must be unique in (the template id for template
/// dashboards, nothing for user dashboards).
pub fn check_batch_names<'a, S: Eq + Hash>(
    scoped: impl IntoIterator<Item = (S, &'a str)>,
) -> Result<(), CoreError> {
    let mut seen = HashSet::new();
    for (scope, name) in scoped {
        if !seen.insert((scope, name)) {
            return Err(name_taken(name));
        }
    }
    Ok(())
}

pub fn name_taken(name: &str) -> CoreError {
    CoreError::Validation(format!("Dashboard \"{name}\" already exists."))
}

/// Reject empty or repeated dashboard id lists.
pub fn check_dashboard_ids(ids: &[DbId]) -> Result<(), CoreError> {
    if ids.is_empty() {
        return Err(CoreError::Validation(
            "At least one dashboard ID is required.".to_string(),
        ));
    }
    if let Some(dup) = first_duplicate(ids.iter().copied()) {
        return Err(CoreError::Validation(format!(
            "Dashboard with ID \"{dup}\" is listed more than once."
        )));
    }
    Ok(())
}

/// Share rows to write so the stored `(target, permission)` list of one
/// dashboard matches the submitted one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharePlan {
    pub inserts: Vec<(DbId, i16)>,
    /// New permission per target.
    pub updates: Vec<(DbId, i16)>,
    pub deletes: Vec<DbId>,
}

impl SharePlan {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }
}

/// Diff share lists keyed by target id. Targets are unique on both sides.
pub fn plan_shares(stored: &[(DbId, i16)], submitted: &[(DbId, i16)]) -> SharePlan {
    let existing: HashMap<DbId, i16> = stored.iter().copied().collect();
    let kept: HashSet<DbId> = submitted.iter().map(|(target, _)| *target).collect();

    let mut plan = SharePlan::default();
    for &(target, permission) in submitted {
        match existing.get(&target) {
            None => plan.inserts.push((target, permission)),
            Some(&current) if current != permission => plan.updates.push((target, permission)),
            Some(_) => {}
        }
    }
    plan.deletes = stored
        .iter()
        .map(|(target, _)| *target)
        .filter(|target| !kept.contains(target))
        .collect();
    plan
}
