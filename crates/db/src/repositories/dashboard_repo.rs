//! Repository for the `dashboard`, `dashboard_user` and `dashboard_usrgrp`
//! tables.
//!
//! Access rules:
//! - user dashboards are readable by their owner, by everyone when not
//!   private, and through user or user-group shares; writable by the owner
//!   and through read-write shares;
//! - template dashboards follow the caller's permission on the template's
//!   host groups, and only admins may write them;
//! - super admins read and write everything.

use panorama_core::dashboard::{
    Caller, DashboardChanges, DashboardKind, NewDashboard, SharePlan, PERM_READ, PERM_READ_WRITE,
};
use panorama_core::object_id::ObjectId;
use panorama_core::types::DbId;
use sqlx::{PgConnection, Postgres, QueryBuilder};

use super::entity_repo::visible_groups_sql;
use crate::models::dashboard::{Dashboard, DashboardFilter, DashboardUser, DashboardUserGroup};

/// Column list for `dashboard` SELECT queries (alias `d`).
const COLUMNS: &str = "\
    d.id, d.name, d.user_id, d.private, d.template_id::text AS template_id, \
    d.created_at, d.updated_at";

/// The two share tables of user dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareTable {
    Users,
    UserGroups,
}

impl ShareTable {
    fn name(self) -> &'static str {
        match self {
            Self::Users => "dashboard_user",
            Self::UserGroups => "dashboard_usrgrp",
        }
    }

    fn target_column(self) -> &'static str {
        match self {
            Self::Users => "user_id",
            Self::UserGroups => "usrgrp_id",
        }
    }
}

/// Restrict `d` to one variant.
fn kind_sql(kind: DashboardKind) -> &'static str {
    match kind {
        DashboardKind::User => "d.template_id IS NULL",
        DashboardKind::Template => "d.template_id IS NOT NULL",
    }
}

/// Access predicate on `d`. Binds: `$1` super admin, `$2` user id, `$3`
/// required permission.
fn access_sql(kind: DashboardKind) -> String {
    match kind {
        DashboardKind::User => format!(
            "($1 OR d.user_id = $2 \
             OR ($3 = {PERM_READ} AND d.private = FALSE) \
             OR EXISTS (SELECT 1 FROM dashboard_user du \
                 WHERE du.dashboard_id = d.id AND du.user_id = $2 AND du.permission >= $3) \
             OR EXISTS (SELECT 1 FROM dashboard_usrgrp dg \
                 JOIN users_groups ug ON ug.usrgrp_id = dg.usrgrp_id \
                 WHERE dg.dashboard_id = d.id AND ug.user_id = $2 AND dg.permission >= $3))"
        ),
        DashboardKind::Template => format!(
            "($1 OR EXISTS (SELECT 1 FROM hosts_groups hg \
                 WHERE hg.host_id = d.template_id AND hg.group_id IN ({})))",
            visible_groups_sql("$2", "$3")
        ),
    }
}

/// Provides data access for dashboards and their shares.
pub struct DashboardRepo;

impl DashboardRepo {
    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Dashboards the caller can read, ordered by id.
    pub async fn list_visible(
        conn: &mut PgConnection,
        kind: DashboardKind,
        caller: &Caller,
        filter: &DashboardFilter,
    ) -> Result<Vec<Dashboard>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM dashboard d \
             WHERE {} AND {} \
             AND ($4::bigint[] IS NULL OR d.id = ANY($4)) \
             AND ($5::text IS NULL OR d.template_id = $5::numeric) \
             ORDER BY d.id",
            kind_sql(kind),
            access_sql(kind)
        );
        sqlx::query_as::<_, Dashboard>(&query)
            .bind(caller.is_super_admin())
            .bind(caller.user_id)
            .bind(PERM_READ)
            .bind(filter.dashboard_ids.as_deref())
            .bind(filter.template_id.as_ref().map(ObjectId::as_str))
            .fetch_all(&mut *conn)
            .await
    }

    /// Those of `ids` the caller can write, ordered by id.
    pub async fn find_editable(
        conn: &mut PgConnection,
        kind: DashboardKind,
        caller: &Caller,
        ids: &[DbId],
    ) -> Result<Vec<Dashboard>, sqlx::Error> {
        if kind == DashboardKind::Template && !caller.can_edit_templates() {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT {COLUMNS} FROM dashboard d \
             WHERE d.id = ANY($4) AND {} AND {} \
             ORDER BY d.id",
            kind_sql(kind),
            access_sql(kind)
        );
        sqlx::query_as::<_, Dashboard>(&query)
            .bind(caller.is_super_admin())
            .bind(caller.user_id)
            .bind(PERM_READ_WRITE)
            .bind(ids)
            .fetch_all(&mut *conn)
            .await
    }

    /// The first candidate name (in input order) already used by a stored
    /// dashboard of the same scope, ignoring the dashboards in `exclude`.
    ///
    /// Each candidate is `(template scope, name)`; the scope is `None` for
    /// user dashboards.
    pub async fn names_taken(
        conn: &mut PgConnection,
        kind: DashboardKind,
        candidates: &[(Option<ObjectId>, String)],
        exclude: &[DbId],
    ) -> Result<Option<String>, sqlx::Error> {
        if candidates.is_empty() {
            return Ok(None);
        }

        let scopes: Vec<Option<String>> = candidates
            .iter()
            .map(|(scope, _)| scope.as_ref().map(|id| id.as_str().to_string()))
            .collect();
        let names: Vec<&str> = candidates.iter().map(|(_, name)| name.as_str()).collect();

        let query = format!(
            "SELECT c.name FROM UNNEST($1::text[], $2::text[]) WITH ORDINALITY AS c(scope, name, ord) \
             JOIN dashboard d ON d.name = c.name \
                 AND d.template_id IS NOT DISTINCT FROM c.scope::numeric \
             WHERE {} AND NOT (d.id = ANY($3)) \
             ORDER BY c.ord LIMIT 1",
            kind_sql(kind)
        );
        sqlx::query_scalar::<_, String>(&query)
            .bind(scopes)
            .bind(names)
            .bind(exclude)
            .fetch_optional(&mut *conn)
            .await
    }

    /// User shares of the given dashboards.
    pub async fn list_user_shares(
        conn: &mut PgConnection,
        dashboard_ids: &[DbId],
    ) -> Result<Vec<DashboardUser>, sqlx::Error> {
        sqlx::query_as::<_, DashboardUser>(
            "SELECT dashboard_id, user_id, permission FROM dashboard_user \
             WHERE dashboard_id = ANY($1) ORDER BY dashboard_id, user_id",
        )
        .bind(dashboard_ids)
        .fetch_all(&mut *conn)
        .await
    }

    /// User-group shares of the given dashboards.
    pub async fn list_group_shares(
        conn: &mut PgConnection,
        dashboard_ids: &[DbId],
    ) -> Result<Vec<DashboardUserGroup>, sqlx::Error> {
        sqlx::query_as::<_, DashboardUserGroup>(
            "SELECT dashboard_id, usrgrp_id, permission FROM dashboard_usrgrp \
             WHERE dashboard_id = ANY($1) ORDER BY dashboard_id, usrgrp_id",
        )
        .bind(dashboard_ids)
        .fetch_all(&mut *conn)
        .await
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Insert one dashboard and return its id.
    pub async fn insert(conn: &mut PgConnection, dto: &NewDashboard) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO dashboard (name, user_id, private, template_id) \
             VALUES ($1, $2, $3, $4::numeric) RETURNING id",
        )
        .bind(&dto.name)
        .bind(dto.user_id)
        .bind(dto.private)
        .bind(dto.template_id.as_ref().map(ObjectId::as_str))
        .fetch_one(&mut *conn)
        .await
    }

    /// Write the changed columns of one dashboard. Does nothing when
    /// `changes` is empty.
    pub async fn apply_update(
        conn: &mut PgConnection,
        id: DbId,
        changes: &DashboardChanges,
    ) -> Result<(), sqlx::Error> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE dashboard SET updated_at = now()");
        if let Some(name) = &changes.name {
            qb.push(", name = ").push_bind(name.clone());
        }
        if let Some(user_id) = changes.user_id {
            qb.push(", user_id = ").push_bind(user_id);
        }
        if let Some(private) = changes.private {
            qb.push(", private = ").push_bind(private);
        }
        if let Some(template_id) = &changes.template_id {
            qb.push(", template_id = ")
                .push_bind(template_id.as_str().to_string())
                .push("::numeric");
        }
        qb.push(" WHERE id = ").push_bind(id);

        qb.build().execute(&mut *conn).await?;
        Ok(())
    }

    /// Delete dashboards. Shares, widgets and widget fields cascade;
    /// refresh-rate preferences must be removed first.
    pub async fn delete_many(conn: &mut PgConnection, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM dashboard WHERE id = ANY($1)")
            .bind(ids)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// `(target, permission)` pairs stored for one dashboard in `table`.
    pub async fn stored_shares(
        conn: &mut PgConnection,
        table: ShareTable,
        dashboard_id: DbId,
    ) -> Result<Vec<(DbId, i16)>, sqlx::Error> {
        let query = format!(
            "SELECT {target}, permission FROM {table} WHERE dashboard_id = $1 ORDER BY {target}",
            target = table.target_column(),
            table = table.name(),
        );
        sqlx::query_as::<_, (DbId, i16)>(&query)
            .bind(dashboard_id)
            .fetch_all(&mut *conn)
            .await
    }

    /// Write a share plan for one dashboard: deletes, then permission
    /// updates, then inserts.
    pub async fn apply_share_plan(
        conn: &mut PgConnection,
        table: ShareTable,
        dashboard_id: DbId,
        plan: &SharePlan,
    ) -> Result<(), sqlx::Error> {
        let target = table.target_column();
        let name = table.name();

        if !plan.deletes.is_empty() {
            let query =
                format!("DELETE FROM {name} WHERE dashboard_id = $1 AND {target} = ANY($2)");
            sqlx::query(&query)
                .bind(dashboard_id)
                .bind(&plan.deletes)
                .execute(&mut *conn)
                .await?;
        }

        if !plan.updates.is_empty() {
            let (targets, permissions): (Vec<DbId>, Vec<i16>) =
                plan.updates.iter().copied().unzip();
            let query = format!(
                "UPDATE {name} s SET permission = u.permission \
                 FROM UNNEST($2::bigint[], $3::smallint[]) AS u(target, permission) \
                 WHERE s.dashboard_id = $1 AND s.{target} = u.target"
            );
            sqlx::query(&query)
                .bind(dashboard_id)
                .bind(targets)
                .bind(permissions)
                .execute(&mut *conn)
                .await?;
        }

        if !plan.inserts.is_empty() {
            let (targets, permissions): (Vec<DbId>, Vec<i16>) =
                plan.inserts.iter().copied().unzip();
            let query = format!(
                "INSERT INTO {name} (dashboard_id, {target}, permission) \
                 SELECT $1, u.target, u.permission \
                 FROM UNNEST($2::bigint[], $3::smallint[]) AS u(target, permission)"
            );
            sqlx::query(&query)
                .bind(dashboard_id)
                .bind(targets)
                .bind(permissions)
                .execute(&mut *conn)
                .await?;
        }

        Ok(())
    }
}
