use panorama_core::types::DbId;
use panorama_core::widget_sync::StoredWidget;
use sqlx::FromRow;

/// A `widget` row.
#[derive(Debug, Clone, FromRow)]
pub struct Widget {
    pub id: DbId,
    pub dashboard_id: DbId,
    #[sqlx(rename = "type")]
    pub widget_type: String,
    pub name: String,
    pub view_mode: i16,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl From<Widget> for StoredWidget {
    fn from(row: Widget) -> Self {
        Self {
            id: row.id,
            dashboard_id: row.dashboard_id,
            widget_type: row.widget_type,
            name: row.name,
            view_mode: row.view_mode,
            x: row.x,
            y: row.y,
            width: row.width,
            height: row.height,
        }
    }
}
