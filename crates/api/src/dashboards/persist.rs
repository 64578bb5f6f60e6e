//! Write steps shared by create, update and delete.

use panorama_core::audit::{build_details, compute_integrity_hash, entry_payload};
use panorama_core::dashboard::{plan_shares, Caller, DashboardKind};
use panorama_core::field_sync::plan_fields;
use panorama_core::types::DbId;
use panorama_core::widget_field::WidgetField;
use panorama_core::widget_sync::{assign_inserted_ids, plan_widgets, StoredWidget, WidgetSpec};
use panorama_db::models::audit::CreateAuditLog;
use panorama_db::repositories::{
    AuditLogRepo, DashboardRepo, ShareTable, WidgetFieldRepo, WidgetRepo,
};
use serde_json::Value;
use sqlx::PgConnection;

use crate::error::{AppError, AppResult};

/// Bring the widgets of the submitted dashboards in line with `submitted`,
/// then their fields.
///
/// Dashboards absent from `submitted` are untouched. New widgets receive
/// their generated ids in place.
pub(super) async fn sync_widgets(
    conn: &mut PgConnection,
    submitted: &mut [(DbId, Vec<WidgetSpec>)],
    stored: &[StoredWidget],
) -> AppResult<()> {
    let plan = plan_widgets(submitted, stored);
    tracing::debug!(
        inserts = plan.inserts.len(),
        updates = plan.updates.len(),
        deletes = plan.deletes.len(),
        "Widget plan"
    );

    WidgetRepo::delete_many(&mut *conn, &plan.deletes).await?;
    WidgetRepo::apply_updates(&mut *conn, &plan.updates).await?;
    let inserted = WidgetRepo::insert_many(&mut *conn, &plan.inserts).await?;
    assign_inserted_ids(submitted, &inserted);

    // Only widgets that carry a `fields` list have their fields replaced.
    let field_lists: Vec<(DbId, Vec<WidgetField>)> = submitted
        .iter()
        .flat_map(|(_, widgets)| widgets.iter())
        .filter_map(|w| Some((w.widget_id?, w.fields.clone()?)))
        .collect();
    if field_lists.is_empty() {
        return Ok(());
    }

    let widget_ids: Vec<DbId> = field_lists.iter().map(|(id, _)| *id).collect();
    let stored_fields = WidgetFieldRepo::list_for_widgets(&mut *conn, &widget_ids).await?;
    let plan = plan_fields(&field_lists, stored_fields);
    tracing::debug!(
        inserts = plan.inserts.len(),
        updates = plan.updates.len(),
        deletes = plan.deletes.len(),
        "Widget field plan"
    );

    WidgetFieldRepo::delete_many(&mut *conn, &plan.deletes).await?;
    WidgetFieldRepo::apply_updates(&mut *conn, &plan.updates).await?;
    WidgetFieldRepo::insert_many(&mut *conn, &plan.inserts).await?;
    Ok(())
}

/// Write the minimal share changes that make the stored list of one
/// dashboard equal `submitted`.
pub(super) async fn sync_shares(
    conn: &mut PgConnection,
    table: ShareTable,
    dashboard_id: DbId,
    submitted: &[(DbId, i16)],
) -> AppResult<()> {
    let stored = DashboardRepo::stored_shares(&mut *conn, table, dashboard_id).await?;
    let plan = plan_shares(&stored, submitted);
    if plan.is_empty() {
        return Ok(());
    }

    tracing::debug!(
        dashboard_id,
        table = ?table,
        inserts = plan.inserts.len(),
        updates = plan.updates.len(),
        deletes = plan.deletes.len(),
        "Share plan"
    );
    DashboardRepo::apply_share_plan(&mut *conn, table, dashboard_id, &plan).await?;
    Ok(())
}

/// One audited dashboard change.
pub(super) struct AuditEntry {
    pub dashboard_id: DbId,
    pub name: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
}

/// Append one chained audit row per entry.
///
/// The chain head is locked for the rest of the transaction so concurrent
/// writers extend the chain one after another.
pub(super) async fn write_audit(
    conn: &mut PgConnection,
    caller: &Caller,
    kind: DashboardKind,
    action: &str,
    entries: Vec<AuditEntry>,
) -> AppResult<()> {
    if entries.is_empty() {
        return Ok(());
    }

    let resource = kind.audit_resource();
    let mut prev = AuditLogRepo::lock_chain_head(&mut *conn).await?;

    let rows: Vec<CreateAuditLog> = entries
        .into_iter()
        .map(|entry| {
            let details = build_details(entry.before.as_ref(), entry.after.as_ref());
            let payload =
                entry_payload(caller.user_id, action, resource, entry.dashboard_id, &details);
            let hash = compute_integrity_hash(prev.as_deref(), &payload);
            prev = Some(hash.clone());
            CreateAuditLog {
                user_id: caller.user_id,
                action: action.to_string(),
                resource: resource.to_string(),
                resource_id: entry.dashboard_id,
                resource_name: entry.name,
                details_json: details,
                integrity_hash: hash,
            }
        })
        .collect();

    AuditLogRepo::batch_insert(&mut *conn, &rows).await?;
    Ok(())
}

/// Serialize an audit snapshot.
pub(super) fn snapshot<T: serde::Serialize>(value: &T) -> AppResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize audit details: {e}")))
}
