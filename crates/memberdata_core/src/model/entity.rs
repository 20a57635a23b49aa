//! Entity record model.
//!
//! # Responsibility
//! - Define the record shape shared by every stored entity type.
//! - Offer typed accessors over the field map.
//!
//! # Invariants
//! - `id` is `None` until the store assigns one, then never changes.
//! - The nil UUID is never a valid identifier.
//! - An absent field is the only representation of "null".

use crate::model::value::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque identifier of a stored entity.
pub type EntityId = Uuid;

/// Shape errors detectable without a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityValidationError {
    NilId,
}

impl Display for EntityValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "entity id must not be nil"),
        }
    }
}

impl Error for EntityValidationError {}

/// A uniquely identified record with named typed fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EntityWire")]
pub struct Entity {
    id: Option<EntityId>,
    fields: BTreeMap<String, FieldValue>,
}

#[derive(Deserialize)]
struct EntityWire {
    id: Option<EntityId>,
    #[serde(default)]
    fields: BTreeMap<String, FieldValue>,
}

impl TryFrom<EntityWire> for Entity {
    type Error = EntityValidationError;

    fn try_from(value: EntityWire) -> Result<Self, Self::Error> {
        let entity = Self {
            id: value.id,
            fields: value.fields,
        };
        entity.validate()?;
        Ok(entity)
    }
}

impl Entity {
    /// Creates an unsaved entity with no fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an entity carrying a caller-chosen identifier.
    ///
    /// Used when identity already exists externally, e.g. imports.
    pub fn with_id(id: EntityId) -> Result<Self, EntityValidationError> {
        let entity = Self {
            id: Some(id),
            fields: BTreeMap::new(),
        };
        entity.validate()?;
        Ok(entity)
    }

    /// Builder-style identifier assignment.
    ///
    /// Unlike `with_id` this does not validate; stores reject a nil id on write.
    pub fn identified_by(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    /// Builder-style field assignment.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn id(&self) -> Option<EntityId> {
        self.id
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    pub fn integer(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(FieldValue::as_integer)
    }

    pub fn reference(&self, field: &str) -> Option<EntityId> {
        self.get(field).and_then(FieldValue::as_reference)
    }

    /// Sets a field, returning the previous value.
    pub fn set(
        &mut self,
        field: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.fields.insert(field.into(), value.into())
    }

    /// Clears a field back to null.
    pub fn clear(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.remove(field)
    }

    /// Returns a copy with the identifier removed.
    ///
    /// Handy for comparing a stored snapshot with the value that was inserted.
    pub fn without_id(&self) -> Self {
        Self {
            id: None,
            fields: self.fields.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), EntityValidationError> {
        match self.id {
            Some(id) if id.is_nil() => Err(EntityValidationError::NilId),
            _ => Ok(()),
        }
    }

    pub(crate) fn assign_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }
}
