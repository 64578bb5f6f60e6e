//! Widget-field synchronization plan.
//!
//! For every widget that carries a `fields` payload, the submitted fields
//! and the stored fields are both sorted by `(type, name)` and paired in
//! lockstep (see [`crate::merge_diff`]). Paired rows become column-minimal
//! updates, stored leftovers are deleted, submitted leftovers inserted.

use std::collections::HashMap;

use crate::merge_diff::{lockstep_sorted, Merge};
use crate::types::DbId;
use crate::widget_field::{
    FieldColumnChanges, FieldColumns, StoredWidgetField, WidgetField, WidgetFieldType,
};

/// A field row to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWidgetField {
    pub widget_id: DbId,
    pub field_type: WidgetFieldType,
    pub name: String,
    pub columns: FieldColumns,
}

/// Changed columns of one stored field row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetFieldUpdate {
    pub id: DbId,
    pub field_type: Option<WidgetFieldType>,
    pub name: Option<String>,
    pub columns: FieldColumnChanges,
}

/// Insert / update / delete sets for `widget_field`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPlan {
    pub inserts: Vec<NewWidgetField>,
    pub updates: Vec<WidgetFieldUpdate>,
    pub deletes: Vec<DbId>,
}

impl FieldPlan {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }
}

/// Compute the field plan.
///
/// `submitted` holds, per widget id, the complete desired field list of
/// that widget. `stored` holds the current rows of those widgets; rows of
/// widgets absent from `submitted` are left alone.
pub fn plan_fields(
    submitted: &[(DbId, Vec<WidgetField>)],
    stored: Vec<StoredWidgetField>,
) -> FieldPlan {
    let mut stored_by_widget: HashMap<DbId, Vec<StoredWidgetField>> = HashMap::new();
    for row in stored {
        stored_by_widget.entry(row.widget_id).or_default().push(row);
    }

    let mut plan = FieldPlan::default();

    for (widget_id, fields) in submitted {
        let stored_rows = stored_by_widget.remove(widget_id).unwrap_or_default();

        let steps = lockstep_sorted(
            stored_rows,
            fields.clone(),
            |a, b| (a.sort_key(), a.id).cmp(&(b.sort_key(), b.id)),
            |a, b| a.sort_key().cmp(&b.sort_key()),
        );

        for step in steps {
            match step {
                Merge::Paired(row, field) => {
                    if let Some(update) = diff_field(&row, &field) {
                        plan.updates.push(update);
                    }
                }
                Merge::StoredOnly(row) => plan.deletes.push(row.id),
                Merge::SubmittedOnly(field) => plan.inserts.push(NewWidgetField {
                    widget_id: *widget_id,
                    field_type: field.field_type,
                    columns: FieldColumns::for_value(field.field_type, &field.value),
                    name: field.name,
                }),
            }
        }
    }

    plan
}

fn diff_field(row: &StoredWidgetField, field: &WidgetField) -> Option<WidgetFieldUpdate> {
    let columns = FieldColumns::for_value(field.field_type, &field.value).changes_from(&row.columns);
    let field_type = (field.field_type != row.field_type).then_some(field.field_type);
    let name = (field.name != row.name).then(|| field.name.clone());

    if field_type.is_none() && name.is_none() && columns.is_empty() {
        return None;
    }

    Some(WidgetFieldUpdate {
        id: row.id,
        field_type,
        name,
        columns,
    })
}
