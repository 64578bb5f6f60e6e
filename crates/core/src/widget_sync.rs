//! Widget validation and the widget synchronization plan.
//!
//! Only dashboards that carry a `widgets` payload are synchronized. For
//! those, submitted widgets without an id are inserted, submitted widgets
//! with an id are compared attribute by attribute against the stored row,
//! and stored widgets that were not submitted are deleted.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::grid::{Placement, MAX_HEIGHT, MAX_WIDTH, MAX_X, MAX_Y, MIN_HEIGHT, MIN_WIDTH};
use crate::types::DbId;
use crate::widget_field::{WidgetField, WidgetFieldInput, WidgetFieldType};

/// Maximum length of a widget name.
pub const MAX_WIDGET_NAME_LEN: usize = 255;

/// `view_mode` values.
pub const VIEW_MODE_DEFAULT: i16 = 0;
pub const VIEW_MODE_HIDDEN_HEADER: i16 = 1;

/// Defaults applied to new widgets.
pub const DEFAULT_X: i32 = 0;
pub const DEFAULT_Y: i32 = 0;
pub const DEFAULT_WIDTH: i32 = 1;
pub const DEFAULT_HEIGHT: i32 = 2;

// ---------------------------------------------------------------------------
// Input and stored shapes
// ---------------------------------------------------------------------------

/// A widget as submitted by the client. Every attribute is optional so an
/// update can touch only what it names.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WidgetInput {
    pub widget_id: Option<DbId>,
    #[serde(rename = "type")]
    pub widget_type: Option<String>,
    pub name: Option<String>,
    pub view_mode: Option<i16>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub fields: Option<Vec<WidgetFieldInput>>,
}

/// A `widget` row as loaded from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredWidget {
    pub id: DbId,
    pub dashboard_id: DbId,
    pub widget_type: String,
    pub name: String,
    pub view_mode: i16,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// A validated widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetSpec {
    pub widget_id: Option<DbId>,
    pub widget_type: Option<String>,
    pub name: Option<String>,
    pub view_mode: Option<i16>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub fields: Option<Vec<WidgetField>>,
}

/// Widget and field types a dashboard variant accepts.
#[derive(Debug, Clone, Copy)]
pub struct WidgetRules {
    pub widget_types: &'static [&'static str],
    pub field_types: &'static [WidgetFieldType],
}

impl WidgetInput {
    /// Validate attribute ranges, the widget type and every field.
    ///
    /// `is_new` widgets must name their type.
    pub fn validate(&self, rules: &WidgetRules) -> Result<WidgetSpec, CoreError> {
        let is_new = self.widget_id.is_none();

        match &self.widget_type {
            Some(t) if !rules.widget_types.contains(&t.as_str()) => {
                return Err(CoreError::Validation(format!(
                    "Invalid widget type \"{t}\"."
                )));
            }
            None if is_new => {
                return Err(CoreError::Validation(
                    "Widget type is required for new widgets.".to_string(),
                ));
            }
            _ => {}
        }

        if let Some(name) = &self.name {
            if name.chars().count() > MAX_WIDGET_NAME_LEN {
                return Err(CoreError::Validation(format!(
                    "Widget name must not be longer than {MAX_WIDGET_NAME_LEN} characters."
                )));
            }
        }

        if let Some(mode) = self.view_mode {
            if mode != VIEW_MODE_DEFAULT && mode != VIEW_MODE_HIDDEN_HEADER {
                return Err(CoreError::Validation(format!(
                    "Invalid widget view mode {mode}."
                )));
            }
        }

        check_range("x", self.x, 0, MAX_X)?;
        check_range("y", self.y, 0, MAX_Y)?;
        check_range("width", self.width, MIN_WIDTH, MAX_WIDTH)?;
        check_range("height", self.height, MIN_HEIGHT, MAX_HEIGHT)?;

        let fields = match &self.fields {
            Some(inputs) => Some(
                inputs
                    .iter()
                    .map(|f| WidgetField::from_input(f, rules.field_types))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };

        Ok(WidgetSpec {
            widget_id: self.widget_id,
            widget_type: self.widget_type.clone(),
            name: self.name.clone(),
            view_mode: self.view_mode,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            fields,
        })
    }
}

fn check_range(attr: &str, value: Option<i32>, min: i32, max: i32) -> Result<(), CoreError> {
    match value {
        Some(v) if v < min || v > max => Err(CoreError::Validation(format!(
            "Invalid widget {attr} {v}: value must be within {min}..{max}."
        ))),
        _ => Ok(()),
    }
}

impl WidgetSpec {
    /// The rectangle this widget will occupy: submitted coordinates first,
    /// then the stored row, then the defaults for new widgets.
    pub fn placement(&self, stored: Option<&StoredWidget>) -> Placement {
        Placement::new(
            self.x.or(stored.map(|w| w.x)).unwrap_or(DEFAULT_X),
            self.y.or(stored.map(|w| w.y)).unwrap_or(DEFAULT_Y),
            self.width.or(stored.map(|w| w.width)).unwrap_or(DEFAULT_WIDTH),
            self.height.or(stored.map(|w| w.height)).unwrap_or(DEFAULT_HEIGHT),
        )
    }
}

/// Check that every submitted widget id is unique and belongs to the
/// dashboard, returning the stored rows keyed by id.
pub fn check_widget_ids<'a>(
    dashboard_name: &str,
    widgets: &[WidgetSpec],
    stored: &'a [StoredWidget],
) -> Result<HashMap<DbId, &'a StoredWidget>, CoreError> {
    let by_id: HashMap<DbId, &StoredWidget> = stored.iter().map(|w| (w.id, w)).collect();
    let mut seen = HashSet::new();

    for id in widgets.iter().filter_map(|w| w.widget_id) {
        if !by_id.contains_key(&id) {
            return Err(CoreError::Validation(format!(
                "Dashboard \"{dashboard_name}\" has no widget with ID \"{id}\"."
            )));
        }
        if !seen.insert(id) {
            return Err(CoreError::Validation(format!(
                "Dashboard \"{dashboard_name}\" widget with ID \"{id}\" is listed more than once."
            )));
        }
    }

    Ok(by_id)
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// A widget row to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWidget {
    pub dashboard_id: DbId,
    pub widget_type: String,
    pub name: String,
    pub view_mode: i16,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Changed attributes of a stored widget; `None` means unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetChanges {
    pub widget_type: Option<String>,
    pub name: Option<String>,
    pub view_mode: Option<i16>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

impl WidgetChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetUpdate {
    pub id: DbId,
    pub changes: WidgetChanges,
}

/// Insert / update / delete sets for `widget`.
///
/// `inserts` keeps submission order so generated ids can be handed back
/// positionally with [`assign_inserted_ids`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetPlan {
    pub inserts: Vec<NewWidget>,
    pub updates: Vec<WidgetUpdate>,
    pub deletes: Vec<DbId>,
}

impl WidgetPlan {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }
}

/// Compute the widget plan for the dashboards in `submitted`.
///
/// `stored` may contain rows of any dashboard; only rows of dashboards
/// present in `submitted` are considered. Submitted ids must have passed
/// [`check_widget_ids`].
pub fn plan_widgets(submitted: &[(DbId, Vec<WidgetSpec>)], stored: &[StoredWidget]) -> WidgetPlan {
    let dashboards: HashSet<DbId> = submitted.iter().map(|(id, _)| *id).collect();
    let mut remaining: HashMap<DbId, &StoredWidget> = stored
        .iter()
        .filter(|w| dashboards.contains(&w.dashboard_id))
        .map(|w| (w.id, w))
        .collect();

    let mut plan = WidgetPlan::default();

    for (dashboard_id, widgets) in submitted {
        for widget in widgets {
            match widget.widget_id {
                Some(id) => {
                    if let Some(stored) = remaining.remove(&id) {
                        let changes = diff_widget(widget, stored);
                        if !changes.is_empty() {
                            plan.updates.push(WidgetUpdate { id, changes });
                        }
                    }
                }
                None => plan.inserts.push(new_widget(*dashboard_id, widget)),
            }
        }
    }

    let mut deletes: Vec<DbId> = remaining.into_keys().collect();
    deletes.sort_unstable();
    plan.deletes = deletes;

    plan
}

fn new_widget(dashboard_id: DbId, widget: &WidgetSpec) -> NewWidget {
    let placement = widget.placement(None);
    NewWidget {
        dashboard_id,
        widget_type: widget.widget_type.clone().unwrap_or_default(),
        name: widget.name.clone().unwrap_or_default(),
        view_mode: widget.view_mode.unwrap_or(VIEW_MODE_DEFAULT),
        x: placement.x,
        y: placement.y,
        width: placement.width,
        height: placement.height,
    }
}

fn diff_widget(widget: &WidgetSpec, stored: &StoredWidget) -> WidgetChanges {
    fn changed<T: PartialEq + Clone>(submitted: &Option<T>, stored: &T) -> Option<T> {
        submitted.as_ref().filter(|v| *v != stored).cloned()
    }

    WidgetChanges {
        widget_type: changed(&widget.widget_type, &stored.widget_type),
        name: changed(&widget.name, &stored.name),
        view_mode: changed(&widget.view_mode, &stored.view_mode),
        x: changed(&widget.x, &stored.x),
        y: changed(&widget.y, &stored.y),
        width: changed(&widget.width, &stored.width),
        height: changed(&widget.height, &stored.height),
    }
}

/// Hand generated ids back to the submitted widgets that lacked one, in
/// the order the inserts were issued.
pub fn assign_inserted_ids(submitted: &mut [(DbId, Vec<WidgetSpec>)], inserted: &[DbId]) {
    let mut ids = inserted.iter().copied();
    for widget in submitted
        .iter_mut()
        .flat_map(|(_, widgets)| widgets.iter_mut())
        .filter(|w| w.widget_id.is_none())
    {
        widget.widget_id = ids.next();
    }
}

// ---------------------------------------------------------------------------
// Refresh rate
// ---------------------------------------------------------------------------

/// Per-user widget refresh intervals in seconds; `0` disables refreshing.
pub const REFRESH_RATES: &[i32] = &[0, 10, 30, 60, 120, 600, 900];

pub fn check_refresh_rate(seconds: i32) -> Result<(), CoreError> {
    if REFRESH_RATES.contains(&seconds) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid refresh rate {seconds}: must be one of {REFRESH_RATES:?}."
        )))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const RULES: WidgetRules = WidgetRules {
        widget_types: &["clock", "graph", "item"],
        field_types: &WidgetFieldType::ALL,
    };

    fn stored(id: DbId, dashboard_id: DbId, x: i32, y: i32) -> StoredWidget {
        StoredWidget {
            id,
            dashboard_id,
            widget_type: "clock".into(),
            name: "Local time".into(),
            view_mode: 0,
            x,
            y,
            width: 4,
            height: 3,
        }
    }

    /// A full resubmission of a stored widget.
    fn echo(w: &StoredWidget) -> WidgetSpec {
        WidgetSpec {
            widget_id: Some(w.id),
            widget_type: Some(w.widget_type.clone()),
            name: Some(w.name.clone()),
            view_mode: Some(w.view_mode),
            x: Some(w.x),
            y: Some(w.y),
            width: Some(w.width),
            height: Some(w.height),
            fields: None,
        }
    }

    fn new_spec(widget_type: &str) -> WidgetSpec {
        WidgetInput {
            widget_type: Some(widget_type.into()),
            ..Default::default()
        }
        .validate(&RULES)
        .unwrap()
    }

    #[test]
    fn identical_submission_produces_empty_plan() {
        let rows = vec![stored(1, 10, 0, 0), stored(2, 10, 4, 0)];
        let submitted = vec![(10, rows.iter().map(echo).collect())];
        assert!(plan_widgets(&submitted, &rows).is_empty());
    }

    #[test]
    fn moving_one_widget_updates_only_its_y() {
        let rows = vec![stored(1, 10, 0, 0), stored(2, 10, 4, 0), stored(3, 10, 8, 0)];
        let mut widgets: Vec<WidgetSpec> = rows.iter().map(echo).collect();
        widgets[1].y = Some(5);

        let plan = plan_widgets(&[(10, widgets)], &rows);
        assert!(plan.inserts.is_empty());
        assert!(plan.deletes.is_empty());
        assert_eq!(
            plan.updates,
            vec![WidgetUpdate {
                id: 2,
                changes: WidgetChanges {
                    y: Some(5),
                    ..Default::default()
                },
            }]
        );
    }

    #[test]
    fn omitted_attributes_are_not_compared() {
        let rows = vec![stored(1, 10, 0, 0)];
        let partial = WidgetSpec {
            widget_id: Some(1),
            widget_type: None,
            name: Some("Renamed".into()),
            view_mode: None,
            x: None,
            y: None,
            width: None,
            height: None,
            fields: None,
        };
        let plan = plan_widgets(&[(10, vec![partial])], &rows);
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].changes.name.as_deref(), Some("Renamed"));
        assert!(plan.updates[0].changes.x.is_none());
    }

    #[test]
    fn missing_widgets_are_deleted_only_on_submitted_dashboards() {
        let rows = vec![stored(1, 10, 0, 0), stored(2, 10, 4, 0), stored(3, 11, 0, 0)];
        let plan = plan_widgets(&[(10, vec![echo(&rows[0])])], &rows);
        assert_eq!(plan.deletes, vec![2]);
    }

    #[test]
    fn new_widgets_get_defaults_and_keep_order() {
        let plan = plan_widgets(&[(10, vec![new_spec("graph"), new_spec("item")])], &[]);
        assert_eq!(plan.inserts.len(), 2);
        assert_eq!(plan.inserts[0].widget_type, "graph");
        assert_eq!(plan.inserts[1].widget_type, "item");
        assert_eq!(plan.inserts[0].width, DEFAULT_WIDTH);
        assert_eq!(plan.inserts[0].height, DEFAULT_HEIGHT);
        assert_eq!(plan.inserts[0].name, "");
    }

    #[test]
    fn inserted_ids_are_assigned_positionally() {
        let rows = vec![stored(1, 10, 0, 0)];
        let mut submitted = vec![
            (10, vec![new_spec("graph"), echo(&rows[0]), new_spec("item")]),
            (11, vec![new_spec("clock")]),
        ];
        assign_inserted_ids(&mut submitted, &[100, 101, 102]);
        assert_eq!(submitted[0].1[0].widget_id, Some(100));
        assert_eq!(submitted[0].1[1].widget_id, Some(1));
        assert_eq!(submitted[0].1[2].widget_id, Some(101));
        assert_eq!(submitted[1].1[0].widget_id, Some(102));
    }

    #[test]
    fn new_widget_requires_type() {
        let err = WidgetInput::default().validate(&RULES).unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    #[test]
    fn unknown_widget_type_is_rejected() {
        let input = WidgetInput {
            widget_type: Some("navtree".into()),
            ..Default::default()
        };
        assert_matches!(input.validate(&RULES), Err(CoreError::Validation(_)));
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let input = WidgetInput {
            widget_type: Some("clock".into()),
            height: Some(1),
            ..Default::default()
        };
        assert_matches!(input.validate(&RULES), Err(CoreError::Validation(msg)) if msg.contains("height"));

        let input = WidgetInput {
            widget_type: Some("clock".into()),
            view_mode: Some(3),
            ..Default::default()
        };
        assert_matches!(input.validate(&RULES), Err(CoreError::Validation(_)));
    }

    #[test]
    fn placement_falls_back_to_stored_then_defaults() {
        let row = stored(1, 10, 6, 7);
        let partial = WidgetSpec {
            x: Some(2),
            ..echo(&row)
        };
        let partial = WidgetSpec {
            y: None,
            ..partial
        };
        assert_eq!(partial.placement(Some(&row)), Placement::new(2, 7, 4, 3));
        assert_eq!(new_spec("clock").placement(None), Placement::new(0, 0, 1, 2));
    }

    #[test]
    fn foreign_and_duplicate_widget_ids_are_rejected() {
        let rows = vec![stored(1, 10, 0, 0)];
        let foreign = WidgetSpec {
            widget_id: Some(99),
            ..echo(&rows[0])
        };
        assert_matches!(
            check_widget_ids("Ops", &[foreign], &rows),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            check_widget_ids("Ops", &[echo(&rows[0]), echo(&rows[0])], &rows),
            Err(CoreError::Validation(_))
        );
        assert!(check_widget_ids("Ops", &[echo(&rows[0])], &rows).is_ok());
    }

    #[test]
    fn refresh_rate_must_be_a_known_interval() {
        assert!(check_refresh_rate(0).is_ok());
        assert!(check_refresh_rate(900).is_ok());
        assert_matches!(check_refresh_rate(45), Err(CoreError::Validation(_)));
    }
}
