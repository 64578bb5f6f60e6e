//! Widget field types and their typed storage columns.
//!
//! A widget field is logically `(type, name, value)`. Physically the value
//! lives in exactly one of seven columns of the `widget_field` table, chosen
//! by the field type; every other value column holds its default.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::object_id::{ObjectId, ObjectIdError};
use crate::references::ReferenceKind;
use crate::types::DbId;

/// Maximum length of a field name or string value.
pub const MAX_FIELD_STR_LEN: usize = 255;

// ---------------------------------------------------------------------------
// Field type
// ---------------------------------------------------------------------------

/// Widget field type codes as stored in `widget_field.type`.
///
/// The declaration order equals the code order, so the derived `Ord` sorts
/// fields the same way the database does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum WidgetFieldType {
    Int = 0,
    Str = 1,
    Group = 2,
    Host = 3,
    Item = 4,
    ItemPrototype = 5,
    Graph = 6,
    GraphPrototype = 7,
    Map = 8,
}

impl WidgetFieldType {
    pub const ALL: [WidgetFieldType; 9] = [
        Self::Int,
        Self::Str,
        Self::Group,
        Self::Host,
        Self::Item,
        Self::ItemPrototype,
        Self::Graph,
        Self::GraphPrototype,
        Self::Map,
    ];

    pub fn code(self) -> i16 {
        self as i16
    }

    /// The storage column this type's value is written to.
    pub fn value_column(self) -> ValueColumn {
        match self {
            Self::Int => ValueColumn::Int,
            Self::Str => ValueColumn::Str,
            Self::Group => ValueColumn::GroupId,
            Self::Host => ValueColumn::HostId,
            Self::Item | Self::ItemPrototype => ValueColumn::ItemId,
            Self::Graph | Self::GraphPrototype => ValueColumn::GraphId,
            Self::Map => ValueColumn::SysmapId,
        }
    }

    /// The kind of entity this type references, if any.
    pub fn reference_kind(self) -> Option<ReferenceKind> {
        match self {
            Self::Int | Self::Str => None,
            Self::Group => Some(ReferenceKind::HostGroup),
            Self::Host => Some(ReferenceKind::Host),
            Self::Item => Some(ReferenceKind::Item),
            Self::ItemPrototype => Some(ReferenceKind::ItemPrototype),
            Self::Graph => Some(ReferenceKind::Graph),
            Self::GraphPrototype => Some(ReferenceKind::GraphPrototype),
            Self::Map => Some(ReferenceKind::Map),
        }
    }
}

impl TryFrom<i16> for WidgetFieldType {
    type Error = String;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|t| t.code() == code)
            .ok_or_else(|| format!("unknown widget field type {code}"))
    }
}

impl From<WidgetFieldType> for i16 {
    fn from(value: WidgetFieldType) -> Self {
        value.code()
    }
}

/// The seven value columns of `widget_field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueColumn {
    Int,
    Str,
    GroupId,
    HostId,
    ItemId,
    GraphId,
    SysmapId,
}

impl ValueColumn {
    pub fn column_name(self) -> &'static str {
        match self {
            Self::Int => "value_int",
            Self::Str => "value_str",
            Self::GroupId => "value_groupid",
            Self::HostId => "value_hostid",
            Self::ItemId => "value_itemid",
            Self::GraphId => "value_graphid",
            Self::SysmapId => "value_sysmapid",
        }
    }
}

// ---------------------------------------------------------------------------
// Logical value
// ---------------------------------------------------------------------------

/// A field value after it has been checked against its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i32),
    Str(String),
    Id(ObjectId),
}

/// A widget field as submitted by the client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WidgetFieldInput {
    #[serde(rename = "type")]
    pub field_type: i16,
    pub name: String,
    pub value: serde_json::Value,
}

/// A validated widget field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetField {
    #[serde(rename = "type")]
    pub field_type: WidgetFieldType,
    pub name: String,
    pub value: FieldValue,
}

impl WidgetField {
    /// Validate a submitted field. `allowed` is the set of field types the
    /// dashboard variant accepts.
    pub fn from_input(
        input: &WidgetFieldInput,
        allowed: &[WidgetFieldType],
    ) -> Result<Self, CoreError> {
        let field_type = WidgetFieldType::try_from(input.field_type)
            .ok()
            .filter(|t| allowed.contains(t))
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid widget field \"{}\": type {} is not allowed.",
                    input.name, input.field_type
                ))
            })?;

        if input.name.is_empty() || input.name.chars().count() > MAX_FIELD_STR_LEN {
            return Err(CoreError::Validation(format!(
                "Invalid widget field name: must be 1 to {MAX_FIELD_STR_LEN} characters long."
            )));
        }

        let value = parse_value(field_type, &input.value).map_err(|reason| {
            CoreError::Validation(format!(
                "Invalid widget field \"{}\" value: {reason}.",
                input.name
            ))
        })?;

        Ok(Self {
            field_type,
            name: input.name.clone(),
            value,
        })
    }

    /// The `(type, name)` key fields are sorted and paired by.
    pub fn sort_key(&self) -> (WidgetFieldType, &str) {
        (self.field_type, self.name.as_str())
    }

    /// The referenced entity, for reference-typed fields.
    pub fn reference(&self) -> Option<(ReferenceKind, &ObjectId)> {
        match (&self.value, self.field_type.reference_kind()) {
            (FieldValue::Id(id), Some(kind)) => Some((kind, id)),
            _ => None,
        }
    }
}

fn parse_value(field_type: WidgetFieldType, raw: &serde_json::Value) -> Result<FieldValue, String> {
    match field_type.value_column() {
        ValueColumn::Int => {
            let parsed = match raw {
                serde_json::Value::Number(n) => n.as_i64(),
                serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            parsed
                .and_then(|v| i32::try_from(v).ok())
                .map(FieldValue::Int)
                .ok_or_else(|| "a 32-bit integer is expected".to_string())
        }
        ValueColumn::Str => match raw {
            serde_json::Value::String(s) if s.chars().count() <= MAX_FIELD_STR_LEN => {
                Ok(FieldValue::Str(s.clone()))
            }
            serde_json::Value::String(_) => Err(format!(
                "value is longer than {MAX_FIELD_STR_LEN} characters"
            )),
            _ => Err("a character string is expected".to_string()),
        },
        _ => {
            let parsed = match raw {
                serde_json::Value::String(s) => ObjectId::parse(s),
                serde_json::Value::Number(n) => n
                    .as_u64()
                    .ok_or(ObjectIdError::NotNumeric)
                    .and_then(ObjectId::try_from),
                _ => Err(ObjectIdError::Empty),
            };
            parsed.map(FieldValue::Id).map_err(|e| e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Storage columns
// ---------------------------------------------------------------------------

/// The physical value columns of one `widget_field` row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldColumns {
    pub value_int: i32,
    pub value_str: String,
    pub value_groupid: Option<ObjectId>,
    pub value_hostid: Option<ObjectId>,
    pub value_itemid: Option<ObjectId>,
    pub value_graphid: Option<ObjectId>,
    pub value_sysmapid: Option<ObjectId>,
}

impl FieldColumns {
    /// Place a value into the column its type maps to; every other column
    /// keeps its schema default.
    pub fn for_value(field_type: WidgetFieldType, value: &FieldValue) -> Self {
        let mut columns = Self::default();
        match (field_type.value_column(), value) {
            (ValueColumn::Int, FieldValue::Int(v)) => columns.value_int = *v,
            (ValueColumn::Str, FieldValue::Str(v)) => columns.value_str = v.clone(),
            (ValueColumn::GroupId, FieldValue::Id(id)) => columns.value_groupid = Some(id.clone()),
            (ValueColumn::HostId, FieldValue::Id(id)) => columns.value_hostid = Some(id.clone()),
            (ValueColumn::ItemId, FieldValue::Id(id)) => columns.value_itemid = Some(id.clone()),
            (ValueColumn::GraphId, FieldValue::Id(id)) => columns.value_graphid = Some(id.clone()),
            (ValueColumn::SysmapId, FieldValue::Id(id)) => {
                columns.value_sysmapid = Some(id.clone())
            }
            // WidgetField::from_input guarantees the value matches its type.
            _ => {}
        }
        columns
    }

    /// Read the logical value back out of the column `field_type` maps to.
    ///
    /// Returns `None` when a reference column is NULL.
    pub fn value(&self, field_type: WidgetFieldType) -> Option<FieldValue> {
        let id = |v: &Option<ObjectId>| v.clone().map(FieldValue::Id);
        match field_type.value_column() {
            ValueColumn::Int => Some(FieldValue::Int(self.value_int)),
            ValueColumn::Str => Some(FieldValue::Str(self.value_str.clone())),
            ValueColumn::GroupId => id(&self.value_groupid),
            ValueColumn::HostId => id(&self.value_hostid),
            ValueColumn::ItemId => id(&self.value_itemid),
            ValueColumn::GraphId => id(&self.value_graphid),
            ValueColumn::SysmapId => id(&self.value_sysmapid),
        }
    }

    /// Columns of `self` that differ from `stored`.
    pub fn changes_from(&self, stored: &FieldColumns) -> FieldColumnChanges {
        fn changed<T: PartialEq + Clone>(new: &T, old: &T) -> Option<T> {
            (new != old).then(|| new.clone())
        }

        FieldColumnChanges {
            value_int: changed(&self.value_int, &stored.value_int),
            value_str: changed(&self.value_str, &stored.value_str),
            value_groupid: changed(&self.value_groupid, &stored.value_groupid),
            value_hostid: changed(&self.value_hostid, &stored.value_hostid),
            value_itemid: changed(&self.value_itemid, &stored.value_itemid),
            value_graphid: changed(&self.value_graphid, &stored.value_graphid),
            value_sysmapid: changed(&self.value_sysmapid, &stored.value_sysmapid),
        }
    }
}

/// Changed value columns of a field update.
///
/// Id columns use `Option<Option<_>>`: the outer `Some` means "write this
/// column", an inner `None` writes NULL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldColumnChanges {
    pub value_int: Option<i32>,
    pub value_str: Option<String>,
    pub value_groupid: Option<Option<ObjectId>>,
    pub value_hostid: Option<Option<ObjectId>>,
    pub value_itemid: Option<Option<ObjectId>>,
    pub value_graphid: Option<Option<ObjectId>>,
    pub value_sysmapid: Option<Option<ObjectId>>,
}

impl FieldColumnChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A `widget_field` row as loaded from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredWidgetField {
    pub id: DbId,
    pub widget_id: DbId,
    pub field_type: WidgetFieldType,
    pub name: String,
    pub columns: FieldColumns,
}

impl StoredWidgetField {
    pub fn sort_key(&self) -> (WidgetFieldType, &str) {
        (self.field_type, self.name.as_str())
    }

    /// The logical field, or `None` if its reference column is NULL.
    pub fn to_field(&self) -> Option<WidgetField> {
        Some(WidgetField {
            field_type: self.field_type,
            name: self.name.clone(),
            value: self.columns.value(self.field_type)?,
        })
    }
}
