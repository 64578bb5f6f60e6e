//! Repository for the `widget` table.

use panorama_core::types::DbId;
use panorama_core::widget_sync::{NewWidget, WidgetUpdate};
use sqlx::{PgConnection, Postgres, QueryBuilder};

use super::ProfileRepo;
use crate::models::widget::Widget;

/// Column list for `widget` SELECT queries.
const COLUMNS: &str = "id, dashboard_id, type, name, view_mode, x, y, width, height";

/// Provides data access for widgets.
pub struct WidgetRepo;

impl WidgetRepo {
    /// Widgets of the given dashboards, ordered by dashboard then id.
    pub async fn list_for_dashboards(
        conn: &mut PgConnection,
        dashboard_ids: &[DbId],
    ) -> Result<Vec<Widget>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM widget WHERE dashboard_id = ANY($1) ORDER BY dashboard_id, id"
        );
        sqlx::query_as::<_, Widget>(&query)
            .bind(dashboard_ids)
            .fetch_all(&mut *conn)
            .await
    }

    /// The dashboard a widget belongs to.
    pub async fn dashboard_of(
        conn: &mut PgConnection,
        widget_id: DbId,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>("SELECT dashboard_id FROM widget WHERE id = $1")
            .bind(widget_id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Ids of the widgets of the given dashboards.
    pub async fn ids_for_dashboards(
        conn: &mut PgConnection,
        dashboard_ids: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>("SELECT id FROM widget WHERE dashboard_id = ANY($1)")
            .bind(dashboard_ids)
            .fetch_all(&mut *conn)
            .await
    }

    /// Insert widgets one by one; the returned ids follow input order.
    pub async fn insert_many(
        conn: &mut PgConnection,
        widgets: &[NewWidget],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let mut ids = Vec::with_capacity(widgets.len());
        for w in widgets {
            let id = sqlx::query_scalar::<_, DbId>(
                "INSERT INTO widget (dashboard_id, type, name, view_mode, x, y, width, height) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
            )
            .bind(w.dashboard_id)
            .bind(&w.widget_type)
            .bind(&w.name)
            .bind(w.view_mode)
            .bind(w.x)
            .bind(w.y)
            .bind(w.width)
            .bind(w.height)
            .fetch_one(&mut *conn)
            .await?;
            ids.push(id);
        }
        Ok(ids)
    }

    /// Write the changed attributes of each widget.
    pub async fn apply_updates(
        conn: &mut PgConnection,
        updates: &[WidgetUpdate],
    ) -> Result<(), sqlx::Error> {
        for update in updates.iter().filter(|u| !u.changes.is_empty()) {
            let c = &update.changes;
            let mut qb = QueryBuilder::<Postgres>::new("UPDATE widget SET ");
            let mut sets = qb.separated(", ");
            if let Some(v) = &c.widget_type {
                sets.push("type = ").push_bind_unseparated(v.clone());
            }
            if let Some(v) = &c.name {
                sets.push("name = ").push_bind_unseparated(v.clone());
            }
            if let Some(v) = c.view_mode {
                sets.push("view_mode = ").push_bind_unseparated(v);
            }
            if let Some(v) = c.x {
                sets.push("x = ").push_bind_unseparated(v);
            }
            if let Some(v) = c.y {
                sets.push("y = ").push_bind_unseparated(v);
            }
            if let Some(v) = c.width {
                sets.push("width = ").push_bind_unseparated(v);
            }
            if let Some(v) = c.height {
                sets.push("height = ").push_bind_unseparated(v);
            }
            qb.push(" WHERE id = ").push_bind(update.id);
            qb.build().execute(&mut *conn).await?;
        }
        Ok(())
    }

    /// Delete widgets together with every user's refresh-rate preference
    /// for them. Widget fields cascade.
    pub async fn delete_many(conn: &mut PgConnection, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        ProfileRepo::delete_for_widgets(&mut *conn, ids).await?;
        let result = sqlx::query("DELETE FROM widget WHERE id = ANY($1)")
            .bind(ids)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete all widgets of the given dashboards, preferences first.
    pub async fn delete_for_dashboards(
        conn: &mut PgConnection,
        dashboard_ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        let ids = Self::ids_for_dashboards(&mut *conn, dashboard_ids).await?;
        Self::delete_many(conn, &ids).await
    }
}
