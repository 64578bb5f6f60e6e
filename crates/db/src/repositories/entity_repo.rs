//! Read-only lookups of the monitoring entities widgets reference, scoped to
//! what the caller may see.
//!
//! Host-group access comes from `rights` through the caller's user groups.
//! A deny (permission 0) from any group wins over every grant. Hosts, items
//! and graphs are visible through the groups of their host. Super admins
//! see everything.

use std::collections::HashSet;

use panorama_core::dashboard::{Caller, PERM_DENY, PERM_READ, PERM_READ_WRITE};
use panorama_core::object_id::ObjectId;
use panorama_core::references::ReferenceKind;
use panorama_core::types::DbId;
use sqlx::PgConnection;

use crate::models::object_id::{id_strings, DbObjectId};

/// Host groups the user `$user` holds at least `$perm` on.
pub(crate) fn visible_groups_sql(user: &str, perm: &str) -> String {
    format!(
        "SELECT r.group_id FROM rights r \
         JOIN users_groups ug ON ug.usrgrp_id = r.usrgrp_id \
         WHERE ug.user_id = {user} \
         GROUP BY r.group_id \
         HAVING MIN(r.permission) > {PERM_DENY} AND MAX(r.permission) >= {perm}"
    )
}

/// `$1` ids, `$2` super admin, `$3` user id, `$4` permission, `$5` template
/// scope (NULL for none).
fn visibility_query(kind: ReferenceKind) -> String {
    let groups = visible_groups_sql("$3", "$4");
    let host_visible = |host_col: &str| {
        format!(
            "($2 OR EXISTS (SELECT 1 FROM hosts_groups hg \
             WHERE hg.host_id = {host_col} AND hg.group_id IN ({groups})))"
        )
    };
    let scope = |host_col: &str| format!("($5::text IS NULL OR {host_col} = $5::numeric)");

    match kind {
        ReferenceKind::HostGroup => format!(
            "SELECT g.id::text FROM host_groups g \
             WHERE g.id = ANY($1::text[]::numeric[]) \
             AND ($2 OR g.id IN ({groups})) AND $5::text IS NULL"
        ),
        ReferenceKind::Host => format!(
            "SELECT h.id::text FROM hosts h \
             WHERE h.id = ANY($1::text[]::numeric[]) AND h.status IN (0, 1) \
             AND {} AND $5::text IS NULL",
            host_visible("h.id")
        ),
        ReferenceKind::Item | ReferenceKind::ItemPrototype => {
            let flags = if kind == ReferenceKind::Item {
                "i.flags IN (0, 4)"
            } else {
                "i.flags = 2"
            };
            format!(
                "SELECT i.id::text FROM items i \
                 WHERE i.id = ANY($1::text[]::numeric[]) AND {flags} AND {} AND {}",
                host_visible("i.host_id"),
                scope("i.host_id")
            )
        }
        ReferenceKind::Graph | ReferenceKind::GraphPrototype => {
            let flags = if kind == ReferenceKind::Graph {
                "gr.flags IN (0, 4)"
            } else {
                "gr.flags = 2"
            };
            format!(
                "SELECT gr.id::text FROM graphs gr \
                 WHERE gr.id = ANY($1::text[]::numeric[]) AND {flags} AND {} AND {}",
                host_visible("gr.host_id"),
                scope("gr.host_id")
            )
        }
        ReferenceKind::Map => "SELECT m.id::text FROM sysmaps m \
             WHERE m.id = ANY($1::text[]::numeric[]) \
             AND ($2 OR m.private = FALSE OR m.user_id = $3) \
             AND $5::text IS NULL"
            .to_string(),
    }
}

/// Provides visibility lookups for reference targets, users and user groups.
pub struct EntityRepo;

impl EntityRepo {
    /// The subset of `ids` of `kind` the caller can read.
    ///
    /// With `template` set, items and graphs must also belong to that
    /// template, and host groups, hosts and maps are never visible.
    pub async fn visible_ids(
        conn: &mut PgConnection,
        kind: ReferenceKind,
        ids: &[ObjectId],
        caller: &Caller,
        template: Option<&ObjectId>,
    ) -> Result<HashSet<ObjectId>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let query = visibility_query(kind);
        let rows = sqlx::query_scalar::<_, DbObjectId>(&query)
            .bind(id_strings(ids))
            .bind(caller.is_super_admin())
            .bind(caller.user_id)
            .bind(PERM_READ)
            .bind(template.map(ObjectId::as_str))
            .fetch_all(&mut *conn)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Whether `template_id` is a template the caller may attach
    /// dashboards to: read-write on one of its groups, or super admin.
    pub async fn template_access(
        conn: &mut PgConnection,
        caller: &Caller,
        template_id: &ObjectId,
    ) -> Result<bool, sqlx::Error> {
        if !caller.can_edit_templates() {
            return Ok(false);
        }

        let query = format!(
            "SELECT EXISTS (SELECT 1 FROM hosts h \
             WHERE h.id = $1::numeric AND h.status = 3 \
             AND ($2 OR EXISTS (SELECT 1 FROM hosts_groups hg \
                 WHERE hg.host_id = h.id AND hg.group_id IN ({}))))",
            visible_groups_sql("$3", "$4")
        );
        sqlx::query_scalar::<_, bool>(&query)
            .bind(template_id.as_str())
            .bind(caller.is_super_admin())
            .bind(caller.user_id)
            .bind(PERM_READ_WRITE)
            .fetch_one(&mut *conn)
            .await
    }

    /// The subset of `ids` that are existing users.
    pub async fn users_exist(
        conn: &mut PgConnection,
        ids: &[DbId],
    ) -> Result<HashSet<DbId>, sqlx::Error> {
        let rows = sqlx::query_scalar::<_, DbId>("SELECT id FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows.into_iter().collect())
    }

    /// The subset of `ids` that are existing user groups.
    pub async fn user_groups_exist(
        conn: &mut PgConnection,
        ids: &[DbId],
    ) -> Result<HashSet<DbId>, sqlx::Error> {
        let rows = sqlx::query_scalar::<_, DbId>("SELECT id FROM user_groups WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows.into_iter().collect())
    }
}
