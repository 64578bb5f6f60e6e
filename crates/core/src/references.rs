//! Collection and verification of entity references held by widget fields.
//!
//! Only references that are new for a widget are checked: a `(type, value)`
//! pair already stored on the same widget was checked when it was saved.
//! This assumes visibility rules do not change underneath stored
//! dashboards; a reference that became invisible since it was saved is
//! accepted again as long as it is not modified.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::CoreError;
use crate::object_id::ObjectId;
use crate::types::DbId;
use crate::widget_field::{WidgetField, WidgetFieldType};

/// Kinds of entities a widget field can reference.
///
/// Declaration order is the order in which kinds are verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    HostGroup,
    Host,
    Item,
    ItemPrototype,
    Graph,
    GraphPrototype,
    Map,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 7] = [
        Self::HostGroup,
        Self::Host,
        Self::Item,
        Self::ItemPrototype,
        Self::Graph,
        Self::GraphPrototype,
        Self::Map,
    ];

    /// Human-readable entity name used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::HostGroup => "Host group",
            Self::Host => "Host",
            Self::Item => "Item",
            Self::ItemPrototype => "Item prototype",
            Self::Graph => "Graph",
            Self::GraphPrototype => "Graph prototype",
            Self::Map => "Map",
        }
    }
}

/// Reference `(type, value)` pairs already stored, keyed by widget id.
pub type StoredReferences = HashMap<DbId, HashSet<(WidgetFieldType, ObjectId)>>;

/// Ids to verify, grouped by kind, de-duplicated, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
    ids: HashMap<ReferenceKind, Vec<ObjectId>>,
    seen: HashSet<(ReferenceKind, ObjectId)>,
}

impl ReferenceSet {
    /// Add the references of one widget's fields.
    ///
    /// `widget_id` is `None` for widgets that do not exist yet; all their
    /// references are new.
    pub fn add_widget(
        &mut self,
        widget_id: Option<DbId>,
        fields: &[WidgetField],
        stored: &StoredReferences,
    ) {
        let stored_pairs = widget_id.and_then(|id| stored.get(&id));

        for field in fields {
            let Some((kind, id)) = field.reference() else {
                continue;
            };

            let unchanged = stored_pairs
                .is_some_and(|pairs| pairs.contains(&(field.field_type, id.clone())));
            if unchanged {
                continue;
            }

            if self.seen.insert((kind, id.clone())) {
                self.ids.entry(kind).or_default().push(id.clone());
            }
        }
    }

    /// Ids of `kind` to look up, in first-seen order.
    pub fn ids(&self, kind: ReferenceKind) -> &[ObjectId] {
        self.ids.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Kinds with at least one id, in verification order.
    pub fn kinds(&self) -> Vec<ReferenceKind> {
        ReferenceKind::ALL
            .into_iter()
            .filter(|k| !self.ids(*k).is_empty())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Fail with the first requested id of `kind` missing from `visible`.
pub fn ensure_visible(
    kind: ReferenceKind,
    requested: &[ObjectId],
    visible: &HashSet<ObjectId>,
) -> Result<(), CoreError> {
    match requested.iter().find(|id| !visible.contains(*id)) {
        Some(missing) => Err(CoreError::Reference(format!(
            "{} with ID \"{missing}\" is not available.",
            kind.label()
        ))),
        None => Ok(()),
    }
}
