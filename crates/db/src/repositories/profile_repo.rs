//! Repository for the `profiles` table (per-user preferences).

use panorama_core::types::DbId;
use sqlx::PgConnection;

/// Profile key of the per-user widget refresh rate; `idx2` is the widget id.
pub const REFRESH_RATE_IDX: &str = "web.dashbrd.widget.rf_rate";

/// Provides access to per-user preferences.
pub struct ProfileRepo;

impl ProfileRepo {
    /// The caller's refresh rate (seconds) for one widget, if set.
    pub async fn get_refresh_rate(
        conn: &mut PgConnection,
        user_id: DbId,
        widget_id: DbId,
    ) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar::<_, i32>(
            "SELECT value_int FROM profiles WHERE user_id = $1 AND idx = $2 AND idx2 = $3",
        )
        .bind(user_id)
        .bind(REFRESH_RATE_IDX)
        .bind(widget_id)
        .fetch_optional(&mut *conn)
        .await
    }

    /// Insert or overwrite the caller's refresh rate for one widget.
    pub async fn set_refresh_rate(
        conn: &mut PgConnection,
        user_id: DbId,
        widget_id: DbId,
        seconds: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO profiles (user_id, idx, idx2, value_int) VALUES ($1, $2, $3, $4) \
             ON CONFLICT ON CONSTRAINT uq_profiles_user_idx \
             DO UPDATE SET value_int = EXCLUDED.value_int",
        )
        .bind(user_id)
        .bind(REFRESH_RATE_IDX)
        .bind(widget_id)
        .bind(seconds)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Delete every user's refresh rate for the given widgets.
    pub async fn delete_for_widgets(
        conn: &mut PgConnection,
        widget_ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        if widget_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM profiles WHERE idx = $1 AND idx2 = ANY($2)")
            .bind(REFRESH_RATE_IDX)
            .bind(widget_ids)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}
