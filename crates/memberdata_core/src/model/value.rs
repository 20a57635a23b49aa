//! Typed field values stored on entities.
//!
//! # Responsibility
//! - Define the closed set of value kinds an entity field can hold.
//! - Provide a total order inside one kind for sorting and range predicates.
//!
//! # Invariants
//! - Values of different kinds are never compared for ordering.

use crate::model::entity::EntityId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Declared type of one schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// UTF-8 string.
    Text,
    /// Signed 64-bit integer.
    Integer,
    /// Identifier of another entity, resolved by explicit lookup.
    Reference,
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Reference => "reference",
        };
        f.write_str(name)
    }
}

impl FieldType {
    /// Whether `<`/`>` style comparisons are meaningful for this type.
    pub fn is_ordered(self) -> bool {
        matches!(self, Self::Text | Self::Integer)
    }
}

/// One concrete field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Reference(EntityId),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Text(_) => FieldType::Text,
            Self::Integer(_) => FieldType::Integer,
            Self::Reference(_) => FieldType::Reference,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<EntityId> {
        match self {
            Self::Reference(value) => Some(*value),
            _ => None,
        }
    }

    /// Orders two values of the same kind.
    ///
    /// Returns `None` when kinds differ. References compare by identifier
    /// bytes so that sorting on a reference column is still deterministic.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Reference(a), Self::Reference(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(value) => write!(f, "{value:?}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Reference(value) => write!(f, "ref:{value}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<EntityId> for FieldValue {
    fn from(value: EntityId) -> Self {
        Self::Reference(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldType, FieldValue};
    use std::cmp::Ordering;
    use uuid::Uuid;

    #[test]
    fn compare_rejects_mixed_kinds() {
        let text = FieldValue::from("10");
        let number = FieldValue::from(10_i64);
        assert_eq!(text.compare(&number), None);
        assert_eq!(number.compare(&FieldValue::from(3)), Some(Ordering::Greater));
    }

    #[test]
    fn reference_is_not_ordered() {
        assert!(!FieldType::Reference.is_ordered());
        assert!(FieldType::Text.is_ordered());
        let id = Uuid::new_v4();
        assert_eq!(FieldValue::from(id).field_type(), FieldType::Reference);
    }
}
