//! Read model returned by dashboard `get` and `list`.

use std::collections::HashMap;

use panorama_core::dashboard::{GroupShare, UserShare};
use panorama_core::object_id::ObjectId;
use panorama_core::types::{DbId, Timestamp};
use panorama_core::widget_field::{StoredWidgetField, WidgetField};
use panorama_db::models::dashboard::{Dashboard, DashboardUser, DashboardUserGroup};
use panorama_db::models::widget::Widget;
use serde::Serialize;

/// A dashboard with its widgets, their fields and (user variant) shares.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub dashboard_id: DbId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<UserShare>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_groups: Option<Vec<GroupShare>>,
    pub widgets: Vec<WidgetView>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct WidgetView {
    pub widget_id: DbId,
    #[serde(rename = "type")]
    pub widget_type: String,
    pub name: String,
    pub view_mode: i16,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Ordered by `(type, name)`.
    pub fields: Vec<WidgetField>,
}

/// Rows loaded for a set of dashboards, ready to be assembled.
pub(super) struct LoadedRows {
    pub dashboards: Vec<Dashboard>,
    pub widgets: Vec<Widget>,
    pub fields: Vec<StoredWidgetField>,
    /// `None` for template dashboards, which have no shares.
    pub shares: Option<(Vec<DashboardUser>, Vec<DashboardUserGroup>)>,
}

/// Group widgets under their dashboards and fields under their widgets.
///
/// Dashboards keep their loaded order; widgets are ordered by id.
pub(super) fn assemble(rows: LoadedRows) -> Vec<DashboardView> {
    let mut fields_by_widget: HashMap<DbId, Vec<WidgetField>> = HashMap::new();
    for row in &rows.fields {
        // A reference whose target row was deleted reads back as NULL.
        if let Some(field) = row.to_field() {
            fields_by_widget.entry(row.widget_id).or_default().push(field);
        }
    }

    let mut widgets_by_dashboard: HashMap<DbId, Vec<WidgetView>> = HashMap::new();
    for w in rows.widgets {
        let mut fields = fields_by_widget.remove(&w.id).unwrap_or_default();
        fields.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        widgets_by_dashboard
            .entry(w.dashboard_id)
            .or_default()
            .push(WidgetView {
                widget_id: w.id,
                widget_type: w.widget_type,
                name: w.name,
                view_mode: w.view_mode,
                x: w.x,
                y: w.y,
                width: w.width,
                height: w.height,
                fields,
            });
    }

    let (mut users, mut groups) = match rows.shares {
        Some((users, groups)) => (
            Some(by_dashboard(users, |s| s.dashboard_id)),
            Some(by_dashboard(groups, |s| s.dashboard_id)),
        ),
        None => (None, None),
    };

    rows.dashboards
        .into_iter()
        .map(|d| {
            let mut widgets = widgets_by_dashboard.remove(&d.id).unwrap_or_default();
            widgets.sort_by_key(|w| w.widget_id);

            let users = users.as_mut().map(|m| {
                let rows = m.remove(&d.id).unwrap_or_default();
                rows.into_iter().map(UserShare::from).collect()
            });
            let user_groups = groups.as_mut().map(|m| {
                let rows = m.remove(&d.id).unwrap_or_default();
                rows.into_iter().map(GroupShare::from).collect()
            });

            DashboardView {
                dashboard_id: d.id,
                name: d.name,
                user_id: d.user_id,
                private: d.private,
                template_id: d.template_id.map(Into::into),
                users,
                user_groups,
                widgets,
                created_at: d.created_at,
                updated_at: d.updated_at,
            }
        })
        .collect()
}

fn by_dashboard<T>(rows: Vec<T>, key: impl Fn(&T) -> DbId) -> HashMap<DbId, Vec<T>> {
    let mut map: HashMap<DbId, Vec<T>> = HashMap::new();
    for row in rows {
        map.entry(key(&row)).or_default().push(row);
    }
    map
}
