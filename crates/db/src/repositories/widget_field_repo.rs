//! Repository for the `widget_field` table.
//!
//! Id columns are `NUMERIC(20,0)`: selected as text and bound as text cast
//! to numeric.

use panorama_core::field_sync::{NewWidgetField, WidgetFieldUpdate};
use panorama_core::object_id::ObjectId;
use panorama_core::references::StoredReferences;
use panorama_core::types::DbId;
use panorama_core::widget_field::{StoredWidgetField, WidgetFieldType};
use sqlx::{PgConnection, Postgres, QueryBuilder};

use crate::models::widget_field::{ReferencePair, WidgetFieldRow};

/// Column list for `widget_field` SELECT queries.
const COLUMNS: &str = "\
    id, widget_id, type, name, value_int, value_str, \
    value_groupid::text AS value_groupid, value_hostid::text AS value_hostid, \
    value_itemid::text AS value_itemid, value_graphid::text AS value_graphid, \
    value_sysmapid::text AS value_sysmapid";

/// Type codes of fields that hold a reference.
const REFERENCE_TYPES: &str = "2, 3, 4, 5, 6, 7, 8";

fn id_text(id: &Option<ObjectId>) -> Option<String> {
    id.as_ref().map(|v| v.as_str().to_string())
}

/// Provides data access for widget fields.
pub struct WidgetFieldRepo;

impl WidgetFieldRepo {
    /// Fields of the given widgets ordered by `(widget_id, type, name, id)`,
    /// the order the field synchronizer pairs them in.
    pub async fn list_for_widgets(
        conn: &mut PgConnection,
        widget_ids: &[DbId],
    ) -> Result<Vec<StoredWidgetField>, sqlx::Error> {
        if widget_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT {COLUMNS} FROM widget_field WHERE widget_id = ANY($1) \
             ORDER BY widget_id, type, name, id"
        );
        let rows = sqlx::query_as::<_, WidgetFieldRow>(&query)
            .bind(widget_ids)
            .fetch_all(&mut *conn)
            .await?;

        rows.into_iter()
            .map(|row| StoredWidgetField::try_from(row).map_err(|e| sqlx::Error::Decode(e.into())))
            .collect()
    }

    /// Stored `(type, referenced id)` pairs of the given widgets.
    pub async fn reference_pairs(
        conn: &mut PgConnection,
        widget_ids: &[DbId],
    ) -> Result<StoredReferences, sqlx::Error> {
        let mut pairs = StoredReferences::new();
        if widget_ids.is_empty() {
            return Ok(pairs);
        }

        let query = format!(
            "SELECT widget_id, type, value FROM ( \
                 SELECT widget_id, type, COALESCE(value_groupid, value_hostid, value_itemid, \
                     value_graphid, value_sysmapid)::text AS value \
                 FROM widget_field WHERE widget_id = ANY($1) AND type IN ({REFERENCE_TYPES}) \
             ) f WHERE value IS NOT NULL"
        );
        let rows = sqlx::query_as::<_, ReferencePair>(&query)
            .bind(widget_ids)
            .fetch_all(&mut *conn)
            .await?;

        for row in rows {
            let field_type =
                WidgetFieldType::try_from(row.field_type).map_err(|e| sqlx::Error::Decode(e.into()))?;
            pairs
                .entry(row.widget_id)
                .or_default()
                .insert((field_type, row.value.into()));
        }
        Ok(pairs)
    }

    /// Insert fields one by one, in input order.
    pub async fn insert_many(
        conn: &mut PgConnection,
        fields: &[NewWidgetField],
    ) -> Result<(), sqlx::Error> {
        for f in fields {
            let c = &f.columns;
            sqlx::query(
                "INSERT INTO widget_field (widget_id, type, name, value_int, value_str, \
                 value_groupid, value_hostid, value_itemid, value_graphid, value_sysmapid) \
                 VALUES ($1, $2, $3, $4, $5, $6::numeric, $7::numeric, $8::numeric, \
                 $9::numeric, $10::numeric)",
            )
            .bind(f.widget_id)
            .bind(f.field_type.code())
            .bind(&f.name)
            .bind(c.value_int)
            .bind(&c.value_str)
            .bind(id_text(&c.value_groupid))
            .bind(id_text(&c.value_hostid))
            .bind(id_text(&c.value_itemid))
            .bind(id_text(&c.value_graphid))
            .bind(id_text(&c.value_sysmapid))
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    /// Write the changed columns of each field row.
    pub async fn apply_updates(
        conn: &mut PgConnection,
        updates: &[WidgetFieldUpdate],
    ) -> Result<(), sqlx::Error> {
        for update in updates {
            let c = &update.columns;
            let mut qb = QueryBuilder::<Postgres>::new("UPDATE widget_field SET ");
            let mut sets = qb.separated(", ");
            let mut any = false;

            if let Some(t) = update.field_type {
                sets.push("type = ").push_bind_unseparated(t.code());
                any = true;
            }
            if let Some(name) = &update.name {
                sets.push("name = ").push_bind_unseparated(name.clone());
                any = true;
            }
            if let Some(v) = c.value_int {
                sets.push("value_int = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = &c.value_str {
                sets.push("value_str = ").push_bind_unseparated(v.clone());
                any = true;
            }
            let id_columns = [
                ("value_groupid", &c.value_groupid),
                ("value_hostid", &c.value_hostid),
                ("value_itemid", &c.value_itemid),
                ("value_graphid", &c.value_graphid),
                ("value_sysmapid", &c.value_sysmapid),
            ];
            for (column, change) in id_columns {
                if let Some(value) = change {
                    sets.push(format!("{column} = "))
                        .push_bind_unseparated(id_text(value))
                        .push_unseparated("::numeric");
                    any = true;
                }
            }

            if !any {
                continue;
            }
            qb.push(" WHERE id = ").push_bind(update.id);
            qb.build().execute(&mut *conn).await?;
        }
        Ok(())
    }

    pub async fn delete_many(conn: &mut PgConnection, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM widget_field WHERE id = ANY($1)")
            .bind(ids)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}
