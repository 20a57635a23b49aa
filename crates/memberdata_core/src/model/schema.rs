//! Entity type declarations.
//!
//! # Responsibility
//! - Declare which fields an entity type carries and their value types.
//! - Validate entities and query terms against those declarations.
//!
//! # Invariants
//! - Field names are unique within a schema and match `FIELD_NAME_RE`.
//! - Declaration order is preserved for display and projection.

use crate::model::entity::Entity;
use crate::model::value::FieldType;
use crate::query::{QueryError, QueryResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static FIELD_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][A-Za-z0-9_]*$").expect("valid field name regex"));

/// Schema construction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    InvalidEntityName(String),
    InvalidFieldName(String),
    DuplicateField(String),
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEntityName(name) => write!(f, "invalid entity name: `{name}`"),
            Self::InvalidFieldName(name) => write!(
                f,
                "invalid field name `{name}`; expected lower camelCase identifier"
            ),
            Self::DuplicateField(name) => write!(f, "field declared twice: `{name}`"),
        }
    }
}

impl Error for SchemaError {}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
}

/// Declared shape of one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    name: String,
    fields: Vec<FieldDef>,
}

impl EntitySchema {
    /// Builds a schema from `(field, type)` declarations.
    ///
    /// # Errors
    /// - `InvalidEntityName` when `name` is blank.
    /// - `InvalidFieldName` when a field is not a lower camelCase identifier.
    /// - `DuplicateField` when a field name repeats.
    pub fn new<N, I, S>(name: N, fields: I) -> Result<Self, SchemaError>
    where
        N: Into<String>,
        I: IntoIterator<Item = (S, FieldType)>,
        S: Into<String>,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SchemaError::InvalidEntityName(name));
        }

        let mut defs: Vec<FieldDef> = Vec::new();
        for (field, field_type) in fields {
            let field = field.into();
            if !FIELD_NAME_RE.is_match(&field) {
                return Err(SchemaError::InvalidFieldName(field));
            }
            if defs.iter().any(|def| def.name == field) {
                return Err(SchemaError::DuplicateField(field));
            }
            defs.push(FieldDef {
                name: field,
                field_type,
            });
        }

        Ok(Self { name, fields: defs })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field_type(&self, field: &str) -> Option<FieldType> {
        self.fields
            .iter()
            .find(|def| def.name == field)
            .map(|def| def.field_type)
    }

    /// Resolves a field or fails with `UnknownField`.
    pub fn require_field(&self, field: &str) -> QueryResult<FieldType> {
        self.field_type(field)
            .ok_or_else(|| QueryError::UnknownField {
                entity: self.name.clone(),
                field: field.to_string(),
            })
    }

    /// Checks every present field of `entity` against the declarations.
    pub fn check_entity(&self, entity: &Entity) -> QueryResult<()> {
        for (field, value) in entity.fields() {
            let expected = self.require_field(field)?;
            let found = value.field_type();
            if expected != found {
                return Err(QueryError::TypeMismatch {
                    field: field.clone(),
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }
}
