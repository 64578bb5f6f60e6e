//! Identifiers of monitoring entities referenced by widget fields.
//!
//! Host groups, hosts, items, graphs and maps use unsigned 64-bit ids that
//! can exceed the range of a signed BIGINT, so they are stored as
//! `NUMERIC(20,0)` and carried around as canonical decimal strings.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Maximum number of decimal digits an object id may have.
pub const MAX_DIGITS: usize = 20;

/// A non-zero unsigned decimal identifier of arbitrary width (up to
/// [`MAX_DIGITS`] digits).
///
/// The inner string is always canonical: ASCII digits only, no leading
/// zeros. Equality and ordering are therefore numeric.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId(String);

/// Why a string could not be parsed as an [`ObjectId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectIdError {
    #[error("an identifier is expected")]
    Empty,
    #[error("an identifier must contain digits only")]
    NotNumeric,
    #[error("an identifier must not be zero")]
    Zero,
    #[error("an identifier must not exceed {MAX_DIGITS} digits")]
    TooLong,
}

impl ObjectId {
    /// Parse a decimal string, stripping leading zeros.
    pub fn parse(raw: &str) -> Result<Self, ObjectIdError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ObjectIdError::Empty);
        }
        if !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ObjectIdError::NotNumeric);
        }
        let canonical = raw.trim_start_matches('0');
        if canonical.is_empty() {
            return Err(ObjectIdError::Zero);
        }
        if canonical.len() > MAX_DIGITS {
            return Err(ObjectIdError::TooLong);
        }
        Ok(Self(canonical.to_string()))
    }

    /// The canonical decimal representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<u64> for ObjectId {
    type Error = ObjectIdError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value == 0 {
            return Err(ObjectIdError::Zero);
        }
        Ok(Self(value.to_string()))
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Ord for ObjectId {
    fn cmp(&self, other: &Self) -> Ordering {
        // Canonical form has no leading zeros, so a longer string is larger.
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for ObjectId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ObjectIdVisitor;

        impl Visitor<'_> for ObjectIdVisitor {
            type Value = ObjectId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a decimal identifier as a string or unsigned integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ObjectId, E> {
                ObjectId::parse(v).map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<ObjectId, E> {
                ObjectId::try_from(v).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<ObjectId, E> {
                u64::try_from(v)
                    .map_err(|_| E::custom(ObjectIdError::NotNumeric))
                    .and_then(|v| self.visit_u64(v))
            }
        }

        deserializer.deserialize_any(ObjectIdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_zeros_are_insignificant() {
        let a = ObjectId::parse("00042").unwrap();
        let b = ObjectId::parse("42").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "42");
    }

    #[test]
    fn ids_beyond_i64_range_are_accepted() {
        let id = ObjectId::parse("18446744073709551615").unwrap();
        assert_eq!(id.to_string(), "18446744073709551615");
        assert!(id > ObjectId::try_from(i64::MAX as u64).unwrap());
    }

    #[test]
    fn ordering_is_numeric() {
        let nine = ObjectId::parse("9").unwrap();
        let ten = ObjectId::parse("10").unwrap();
        assert!(nine < ten);
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(ObjectId::parse(""), Err(ObjectIdError::Empty));
        assert_eq!(ObjectId::parse("12a"), Err(ObjectIdError::NotNumeric));
        assert_eq!(ObjectId::parse("-5"), Err(ObjectIdError::NotNumeric));
        assert_eq!(ObjectId::parse("000"), Err(ObjectIdError::Zero));
        assert_eq!(
            ObjectId::parse("123456789012345678901"),
            Err(ObjectIdError::TooLong)
        );
    }

    #[test]
    fn deserializes_from_string_or_number() {
        let from_str: ObjectId = serde_json::from_str("\"10084\"").unwrap();
        let from_num: ObjectId = serde_json::from_str("10084").unwrap();
        assert_eq!(from_str, from_num);
        assert!(serde_json::from_str::<ObjectId>("0").is_err());
        assert!(serde_json::from_str::<ObjectId>("-3").is_err());
    }

    #[test]
    fn serializes_as_string() {
        let id = ObjectId::parse("10084").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"10084\"");
    }
}
