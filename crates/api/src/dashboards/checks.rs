//! Validation steps that need the database.
//!
//! Each step returns the first failure it finds. Nothing here writes.

use panorama_core::dashboard::{name_taken, Caller, DashboardInput, DashboardKind};
use panorama_core::error::CoreError;
use panorama_core::object_id::ObjectId;
use panorama_core::references::{ensure_visible, ReferenceSet, StoredReferences};
use panorama_core::types::DbId;
use panorama_core::widget_field::WidgetField;
use panorama_core::widget_sync::WidgetSpec;
use panorama_db::repositories::{DashboardRepo, EntityRepo};
use sqlx::PgConnection;

use crate::error::AppResult;

/// Owners, shared users and user groups must exist.
pub(super) async fn check_share_targets(
    conn: &mut PgConnection,
    inputs: &[DashboardInput],
) -> AppResult<()> {
    let user_ids: Vec<DbId> = inputs
        .iter()
        .flat_map(|d| {
            d.user_id
                .into_iter()
                .chain(d.users.iter().flatten().map(|s| s.user_id))
        })
        .collect();
    if !user_ids.is_empty() {
        let found = EntityRepo::users_exist(&mut *conn, &user_ids).await?;
        if let Some(missing) = user_ids.iter().find(|id| !found.contains(*id)) {
            return Err(CoreError::Validation(format!(
                "User with ID \"{missing}\" is not available."
            ))
            .into());
        }
    }

    let group_ids: Vec<DbId> = inputs
        .iter()
        .flat_map(|d| d.user_groups.iter().flatten().map(|s| s.usrgrp_id))
        .collect();
    if !group_ids.is_empty() {
        let found = EntityRepo::user_groups_exist(&mut *conn, &group_ids).await?;
        if let Some(missing) = group_ids.iter().find(|id| !found.contains(*id)) {
            return Err(CoreError::Validation(format!(
                "User group with ID \"{missing}\" is not available."
            ))
            .into());
        }
    }

    Ok(())
}

/// The caller must be able to attach dashboards to every listed template.
pub(super) async fn check_template_access<'a>(
    conn: &mut PgConnection,
    caller: &Caller,
    templates: impl IntoIterator<Item = &'a ObjectId>,
) -> AppResult<()> {
    let mut checked: Vec<&ObjectId> = Vec::new();
    for template_id in templates {
        if checked.contains(&template_id) {
            continue;
        }
        if !EntityRepo::template_access(&mut *conn, caller, template_id).await? {
            return Err(CoreError::no_permissions().into());
        }
        checked.push(template_id);
    }
    Ok(())
}

/// No candidate `(scope, name)` may already be used by a stored dashboard
/// outside `exclude`.
pub(super) async fn check_stored_names(
    conn: &mut PgConnection,
    kind: DashboardKind,
    candidates: Vec<(Option<ObjectId>, String)>,
    exclude: &[DbId],
) -> AppResult<()> {
    match DashboardRepo::names_taken(conn, kind, &candidates, exclude).await? {
        Some(name) => Err(name_taken(&name).into()),
        None => Ok(()),
    }
}

/// References to verify, grouped by the template scope they must belong to
/// (`None` for user dashboards). Scopes keep first-seen order.
#[derive(Default)]
pub(super) struct ScopedReferences {
    scopes: Vec<(Option<ObjectId>, ReferenceSet)>,
}

impl ScopedReferences {
    fn set_for(&mut self, scope: Option<&ObjectId>) -> &mut ReferenceSet {
        let pos = match self.scopes.iter().position(|(s, _)| s.as_ref() == scope) {
            Some(pos) => pos,
            None => {
                self.scopes.push((scope.cloned(), ReferenceSet::default()));
                self.scopes.len() - 1
            }
        };
        &mut self.scopes[pos].1
    }

    /// Add the fields of submitted widgets, skipping pairs already stored
    /// on the same widget.
    pub fn add_widgets(
        &mut self,
        scope: Option<&ObjectId>,
        widgets: &[WidgetSpec],
        stored: &StoredReferences,
    ) {
        let set = self.set_for(scope);
        for widget in widgets {
            if let Some(fields) = &widget.fields {
                set.add_widget(widget.widget_id, fields, stored);
            }
        }
    }

    /// Add fields that must all be verified regardless of what is stored.
    pub fn add_fields(&mut self, scope: Option<&ObjectId>, fields: &[WidgetField]) {
        self.set_for(scope)
            .add_widget(None, fields, &StoredReferences::new());
    }

    /// Look every collected id up with the caller's visibility and fail on
    /// the first one that is missing.
    pub async fn verify(&self, conn: &mut PgConnection, caller: &Caller) -> AppResult<()> {
        for (scope, set) in &self.scopes {
            for kind in set.kinds() {
                let ids = set.ids(kind);
                let visible =
                    EntityRepo::visible_ids(&mut *conn, kind, ids, caller, scope.as_ref()).await?;
                ensure_visible(kind, ids, &visible)?;
            }
        }
        Ok(())
    }
}
