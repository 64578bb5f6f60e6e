//! Dashboard orchestration.
//!
//! [`DashboardService`] runs every batch operation inside one transaction:
//! validate everything first, then write, then append the audit trail. A
//! failure at any step drops the transaction, so a rejected batch leaves
//! no trace.

mod checks;
mod persist;
pub mod view;

use std::collections::HashMap;

use panorama_core::audit::actions;
use panorama_core::dashboard::{
    check_batch_names, check_dashboard_ids, Caller, DashboardInput, DashboardKind,
    StoredDashboard,
};
use panorama_core::error::CoreError;
use panorama_core::grid::check_grid;
use panorama_core::object_id::ObjectId;
use panorama_core::references::StoredReferences;
use panorama_core::types::DbId;
use panorama_core::widget_field::WidgetField;
use panorama_core::widget_sync::{check_widget_ids, StoredWidget, WidgetSpec};
use panorama_db::models::dashboard::DashboardFilter;
use panorama_db::repositories::{DashboardRepo, ShareTable, WidgetFieldRepo, WidgetRepo};
use panorama_db::DbPool;
use sqlx::PgConnection;

use self::checks::{
    check_share_targets, check_stored_names, check_template_access, ScopedReferences,
};
use self::persist::{snapshot, sync_shares, sync_widgets, write_audit, AuditEntry};
use self::view::{assemble, DashboardView, LoadedRows};
use crate::error::{AppError, AppResult};

/// Create, update, delete and read dashboards of one variant.
#[derive(Debug, Clone, Copy)]
pub struct DashboardService {
    kind: DashboardKind,
}

impl DashboardService {
    pub const fn new(kind: DashboardKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> DashboardKind {
        self.kind
    }

    // -----------------------------------------------------------------------
    // Create
    // -----------------------------------------------------------------------

    /// Create a batch of dashboards. Returns their ids in input order.
    pub async fn create(
        &self,
        pool: &DbPool,
        caller: &Caller,
        inputs: &[DashboardInput],
    ) -> AppResult<Vec<DbId>> {
        let kind = self.kind;
        if inputs.is_empty() {
            let err = CoreError::Validation("At least one dashboard is required.".into());
            return Err(err.into());
        }
        for input in inputs {
            input.validate_shape(kind, true)?;
            if kind == DashboardKind::User {
                input.validate_user_fields(caller)?;
            }
        }

        check_batch_names(inputs.iter().map(|d| (d.template_id.clone(), name_of(d))))?;

        let rules = kind.widget_rules();
        let mut widgets: Vec<Vec<WidgetSpec>> = Vec::with_capacity(inputs.len());
        for input in inputs {
            let specs = input
                .widgets
                .iter()
                .flatten()
                .map(|w| w.validate(&rules))
                .collect::<Result<Vec<_>, _>>()?;
            let placements: Vec<_> = specs.iter().map(|w| w.placement(None)).collect();
            check_grid(name_of(input), &placements)?;
            widgets.push(specs);
        }

        let mut tx = pool.begin().await?;

        match kind {
            DashboardKind::User => {
                check_share_targets(&mut tx, inputs).await?;
            }
            DashboardKind::Template => {
                let templates: Vec<&ObjectId> =
                    inputs.iter().filter_map(|d| d.template_id.as_ref()).collect();
                check_template_access(&mut tx, caller, templates).await?;
            }
        }

        let candidates = inputs
            .iter()
            .map(|d| (d.template_id.clone(), name_of(d).to_string()))
            .collect();
        check_stored_names(&mut tx, kind, candidates, &[]).await?;

        let mut references = ScopedReferences::default();
        let no_stored = StoredReferences::new();
        for (input, specs) in inputs.iter().zip(&widgets) {
            references.add_widgets(input.template_id.as_ref(), specs, &no_stored);
        }
        references.verify(&mut tx, caller).await?;

        // Validation is complete; everything below writes.
        let mut ids = Vec::with_capacity(inputs.len());
        for input in inputs {
            let id = DashboardRepo::insert(&mut tx, &input.to_new(kind, caller)).await?;
            write_shares(&mut tx, id, input).await?;
            ids.push(id);
        }

        let mut submitted: Vec<(DbId, Vec<WidgetSpec>)> =
            ids.iter().copied().zip(widgets).collect();
        sync_widgets(&mut tx, &mut submitted, &[]).await?;

        let entries = inputs
            .iter()
            .zip(&ids)
            .map(|(input, id)| -> AppResult<AuditEntry> {
                Ok(AuditEntry {
                    dashboard_id: *id,
                    name: name_of(input).to_string(),
                    before: None,
                    after: Some(snapshot(input)?),
                })
            })
            .collect::<AppResult<Vec<_>>>()?;
        write_audit(&mut tx, caller, kind, actions::ADD, entries).await?;

        tx.commit().await?;
        tracing::info!(
            kind = ?kind,
            user_id = caller.user_id,
            dashboard_ids = ?ids,
            "Dashboards created"
        );
        Ok(ids)
    }

    // -----------------------------------------------------------------------
    // Update
    // -----------------------------------------------------------------------

    /// Update a batch of dashboards the caller can edit. Returns their ids
    /// in input order.
    pub async fn update(
        &self,
        pool: &DbPool,
        caller: &Caller,
        inputs: &[DashboardInput],
    ) -> AppResult<Vec<DbId>> {
        let kind = self.kind;
        for input in inputs {
            input.validate_shape(kind, false)?;
            if kind == DashboardKind::User {
                input.validate_user_fields(caller)?;
            }
        }
        let ids: Vec<DbId> = inputs.iter().filter_map(|d| d.dashboard_id).collect();
        check_dashboard_ids(&ids)?;

        let mut tx = pool.begin().await?;

        let stored: HashMap<DbId, StoredDashboard> =
            DashboardRepo::find_editable(&mut tx, kind, caller, &ids)
                .await?
                .into_iter()
                .map(|row| (row.id, StoredDashboard::from(row)))
                .collect();
        if stored.len() != ids.len() {
            return Err(CoreError::no_permissions().into());
        }

        // Pair each input with its stored row, in input order.
        let pairs: Vec<(&DashboardInput, &StoredDashboard)> = inputs
            .iter()
            .zip(&ids)
            .map(|(input, id)| stored.get(id).map(|s| (input, s)))
            .collect::<Option<_>>()
            .ok_or_else(CoreError::no_permissions)?;

        check_batch_names(
            pairs
                .iter()
                .map(|(input, s)| (effective_scope(input, s), effective_name(input, s))),
        )?;

        match kind {
            DashboardKind::User => {
                check_share_targets(&mut tx, inputs).await?;
            }
            DashboardKind::Template => {
                let moved: Vec<ObjectId> = pairs
                    .iter()
                    .filter(|(input, s)| input.changes_from(s).template_id.is_some())
                    .filter_map(|(input, _)| input.template_id.clone())
                    .collect();
                check_template_access(&mut tx, caller, moved.iter()).await?;
            }
        }

        let renamed: Vec<(Option<ObjectId>, String)> = pairs
            .iter()
            .filter(|(input, s)| {
                let changes = input.changes_from(s);
                changes.name.is_some() || changes.template_id.is_some()
            })
            .map(|(input, s)| {
                let name = effective_name(input, s).to_string();
                (effective_scope(input, s), name)
            })
            .collect();
        check_stored_names(&mut tx, kind, renamed, &ids).await?;

        // Widgets: validate against the stored rows of each dashboard.
        let stored_widgets: Vec<StoredWidget> = WidgetRepo::list_for_dashboards(&mut tx, &ids)
            .await?
            .into_iter()
            .map(StoredWidget::from)
            .collect();
        let rules = kind.widget_rules();
        let mut submitted: Vec<(DbId, Vec<WidgetSpec>)> = Vec::new();
        for (input, s) in &pairs {
            let Some(widget_inputs) = &input.widgets else {
                continue;
            };
            let name = effective_name(input, s);
            let specs = widget_inputs
                .iter()
                .map(|w| w.validate(&rules))
                .collect::<Result<Vec<_>, _>>()?;
            let own: Vec<StoredWidget> = stored_widgets
                .iter()
                .filter(|w| w.dashboard_id == s.id)
                .cloned()
                .collect();
            let by_id = check_widget_ids(name, &specs, &own)?;
            let placements: Vec<_> = specs
                .iter()
                .map(|w| w.placement(w.widget_id.and_then(|id| by_id.get(&id).copied())))
                .collect();
            check_grid(name, &placements)?;
            submitted.push((s.id, specs));
        }

        // References: only pairs new to a widget are checked, except on
        // dashboards moved to another template, where everything is.
        let stored_widget_ids: Vec<DbId> = stored_widgets.iter().map(|w| w.id).collect();
        let stored_refs = WidgetFieldRepo::reference_pairs(&mut tx, &stored_widget_ids).await?;
        let no_stored = StoredReferences::new();
        let mut references = ScopedReferences::default();
        for (input, s) in &pairs {
            let scope = effective_scope(input, s);
            let moved = input.changes_from(s).template_id.is_some();
            let specs = submitted.iter().find(|(id, _)| *id == s.id).map(|(_, w)| w);
            match (specs, moved) {
                (Some(specs), moved) => {
                    let stored = if moved { &no_stored } else { &stored_refs };
                    references.add_widgets(scope.as_ref(), specs, stored);
                }
                (None, true) => {
                    let fields = stored_fields_of(&mut tx, &stored_widgets, s.id).await?;
                    references.add_fields(scope.as_ref(), &fields);
                }
                (None, false) => {}
            }
        }
        references.verify(&mut tx, caller).await?;

        // Validation is complete; everything below writes.
        let mut entries = Vec::with_capacity(pairs.len());
        for (input, s) in &pairs {
            DashboardRepo::apply_update(&mut tx, s.id, &input.changes_from(s)).await?;
            write_shares(&mut tx, s.id, input).await?;
            entries.push(AuditEntry {
                dashboard_id: s.id,
                name: effective_name(input, s).to_string(),
                before: Some(snapshot(*s)?),
                after: Some(snapshot(*input)?),
            });
        }

        sync_widgets(&mut tx, &mut submitted, &stored_widgets).await?;
        write_audit(&mut tx, caller, kind, actions::UPDATE, entries).await?;

        tx.commit().await?;
        tracing::info!(
            kind = ?kind,
            user_id = caller.user_id,
            dashboard_ids = ?ids,
            "Dashboards updated"
        );
        Ok(ids)
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    /// Delete dashboards the caller can edit, with their widgets, fields,
    /// shares and widget refresh-rate preferences.
    pub async fn delete(
        &self,
        pool: &DbPool,
        caller: &Caller,
        ids: &[DbId],
    ) -> AppResult<Vec<DbId>> {
        let kind = self.kind;
        check_dashboard_ids(ids)?;

        let mut tx = pool.begin().await?;

        let editable = DashboardRepo::find_editable(&mut tx, kind, caller, ids).await?;
        if editable.len() != ids.len() {
            return Err(CoreError::no_permissions().into());
        }

        let widgets_deleted = WidgetRepo::delete_for_dashboards(&mut tx, ids).await?;
        DashboardRepo::delete_many(&mut tx, ids).await?;

        let entries = editable
            .into_iter()
            .map(|row| -> AppResult<AuditEntry> {
                let stored = StoredDashboard::from(row);
                Ok(AuditEntry {
                    dashboard_id: stored.id,
                    before: Some(snapshot(&stored)?),
                    name: stored.name,
                    after: None,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;
        write_audit(&mut tx, caller, kind, actions::DELETE, entries).await?;

        tx.commit().await?;
        tracing::info!(
            kind = ?kind,
            user_id = caller.user_id,
            dashboard_ids = ?ids,
            widgets_deleted,
            "Dashboards deleted"
        );
        Ok(ids.to_vec())
    }

    // -----------------------------------------------------------------------
    // Read
    // -----------------------------------------------------------------------

    /// Dashboards visible to the caller, with widgets and fields.
    pub async fn get(
        &self,
        pool: &DbPool,
        caller: &Caller,
        filter: &DashboardFilter,
    ) -> AppResult<Vec<DashboardView>> {
        let mut conn = pool.acquire().await?;

        let dashboards = DashboardRepo::list_visible(&mut conn, self.kind, caller, filter).await?;
        let ids: Vec<DbId> = dashboards.iter().map(|d| d.id).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let widgets = WidgetRepo::list_for_dashboards(&mut conn, &ids).await?;
        let widget_ids: Vec<DbId> = widgets.iter().map(|w| w.id).collect();
        let fields = WidgetFieldRepo::list_for_widgets(&mut conn, &widget_ids).await?;
        let shares = match self.kind {
            DashboardKind::User => Some((
                DashboardRepo::list_user_shares(&mut conn, &ids).await?,
                DashboardRepo::list_group_shares(&mut conn, &ids).await?,
            )),
            DashboardKind::Template => None,
        };

        Ok(assemble(LoadedRows {
            dashboards,
            widgets,
            fields,
            shares,
        }))
    }

    /// One visible dashboard.
    pub async fn get_one(
        &self,
        pool: &DbPool,
        caller: &Caller,
        id: DbId,
    ) -> AppResult<DashboardView> {
        let filter = DashboardFilter {
            dashboard_ids: Some(vec![id]),
            template_id: None,
        };
        self.get(pool, caller, &filter)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::Core(CoreError::NotFound {
                    entity: "dashboard",
                    id,
                })
            })
    }
}

/// Fail unless `widget_id` is on a dashboard of either variant the caller
/// can read.
pub async fn ensure_widget_visible(
    pool: &DbPool,
    caller: &Caller,
    widget_id: DbId,
) -> AppResult<()> {
    let not_found = || {
        AppError::Core(CoreError::NotFound {
            entity: "widget",
            id: widget_id,
        })
    };

    let mut conn = pool.acquire().await?;
    let dashboard_id = WidgetRepo::dashboard_of(&mut conn, widget_id)
        .await?
        .ok_or_else(not_found)?;

    let filter = DashboardFilter {
        dashboard_ids: Some(vec![dashboard_id]),
        template_id: None,
    };
    for kind in [DashboardKind::User, DashboardKind::Template] {
        let visible = DashboardRepo::list_visible(&mut conn, kind, caller, &filter).await?;
        if !visible.is_empty() {
            return Ok(());
        }
    }
    Err(not_found())
}

fn name_of(input: &DashboardInput) -> &str {
    input.name.as_deref().unwrap_or_default()
}

/// The name a dashboard will have once the input is applied.
fn effective_name<'a>(input: &'a DashboardInput, stored: &'a StoredDashboard) -> &'a str {
    input.name.as_deref().unwrap_or(&stored.name)
}

/// The template a dashboard will belong to once the input is applied.
fn effective_scope(input: &DashboardInput, stored: &StoredDashboard) -> Option<ObjectId> {
    input
        .template_id
        .clone()
        .or_else(|| stored.template_id.clone())
}

/// Bring the share lists an input carries in line with the stored ones;
/// absent lists stay as stored.
async fn write_shares(
    conn: &mut PgConnection,
    dashboard_id: DbId,
    input: &DashboardInput,
) -> AppResult<()> {
    if let Some(users) = &input.users {
        let submitted: Vec<(DbId, i16)> =
            users.iter().map(|s| (s.user_id, s.permission)).collect();
        sync_shares(&mut *conn, ShareTable::Users, dashboard_id, &submitted).await?;
    }
    if let Some(groups) = &input.user_groups {
        let submitted: Vec<(DbId, i16)> =
            groups.iter().map(|s| (s.usrgrp_id, s.permission)).collect();
        sync_shares(&mut *conn, ShareTable::UserGroups, dashboard_id, &submitted).await?;
    }
    Ok(())
}

/// The logical fields of every stored widget of one dashboard.
async fn stored_fields_of(
    conn: &mut PgConnection,
    stored_widgets: &[StoredWidget],
    dashboard_id: DbId,
) -> AppResult<Vec<WidgetField>> {
    let widget_ids: Vec<DbId> = stored_widgets
        .iter()
        .filter(|w| w.dashboard_id == dashboard_id)
        .map(|w| w.id)
        .collect();
    let rows = WidgetFieldRepo::list_for_widgets(conn, &widget_ids).await?;
    Ok(rows.iter().filter_map(|row| row.to_field()).collect())
}
