use panorama_core::types::DbId;
use panorama_core::widget_field::{FieldColumns, StoredWidgetField, WidgetFieldType};
use sqlx::FromRow;

use super::object_id::DbObjectId;

/// A `widget_field` row with its id columns cast to text.
#[derive(Debug, Clone, FromRow)]
pub struct WidgetFieldRow {
    pub id: DbId,
    pub widget_id: DbId,
    #[sqlx(rename = "type")]
    pub field_type: i16,
    pub name: String,
    pub value_int: i32,
    pub value_str: String,
    pub value_groupid: Option<DbObjectId>,
    pub value_hostid: Option<DbObjectId>,
    pub value_itemid: Option<DbObjectId>,
    pub value_graphid: Option<DbObjectId>,
    pub value_sysmapid: Option<DbObjectId>,
}

impl TryFrom<WidgetFieldRow> for StoredWidgetField {
    type Error = String;

    fn try_from(row: WidgetFieldRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            widget_id: row.widget_id,
            field_type: WidgetFieldType::try_from(row.field_type)?,
            name: row.name,
            columns: FieldColumns {
                value_int: row.value_int,
                value_str: row.value_str,
                value_groupid: row.value_groupid.map(Into::into),
                value_hostid: row.value_hostid.map(Into::into),
                value_itemid: row.value_itemid.map(Into::into),
                value_graphid: row.value_graphid.map(Into::into),
                value_sysmapid: row.value_sysmapid.map(Into::into),
            },
        })
    }
}

/// One stored reference: the widget, the field type and the referenced id.
#[derive(Debug, Clone, FromRow)]
pub struct ReferencePair {
    pub widget_id: DbId,
    #[sqlx(rename = "type")]
    pub field_type: i16,
    pub value: DbObjectId,
}
