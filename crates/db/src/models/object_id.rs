//! Text-cast decoding of `NUMERIC(20,0)` id columns.

use panorama_core::object_id::ObjectId;
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgTypeInfo, PgValueRef};
use sqlx::{Decode, Postgres, Type};

/// An [`ObjectId`] read from a `<column>::text` expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DbObjectId(pub ObjectId);

impl Type<Postgres> for DbObjectId {
    fn type_info() -> PgTypeInfo {
        <String as Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for DbObjectId {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let raw = <&str as Decode<Postgres>>::decode(value)?;
        Ok(Self(ObjectId::parse(raw)?))
    }
}

impl From<DbObjectId> for ObjectId {
    fn from(value: DbObjectId) -> Self {
        value.0
    }
}

/// Id strings for binding as `$n::text[]::numeric[]`.
pub fn id_strings(ids: &[ObjectId]) -> Vec<String> {
    ids.iter().map(|id| id.as_str().to_string()).collect()
}
