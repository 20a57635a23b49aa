//! Entity repository contract and error type.
//!
//! # Responsibility
//! - Define the CRUD surface every entity store implements.
//! - Map schema, identity and lookup failures onto one semantic error.
//!
//! # Invariants
//! - Write paths validate against the store schema before mutating.
//! - Reads hand out owned snapshots, never references into the store.

use crate::model::entity::{Entity, EntityId, EntityValidationError};
use crate::model::schema::EntitySchema;
use crate::query::QueryError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for entity persistence and query operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    Validation(EntityValidationError),
    /// Entity fields do not fit the store schema.
    InvalidEntity(QueryError),
    /// Predicate, sort or page request rejected.
    Query(QueryError),
    NotFound(EntityId),
    DuplicateIdentifier(EntityId),
    MissingIdentifier,
    IdentifierChanged {
        expected: EntityId,
        found: Option<EntityId>,
    },
    NonUniqueResult {
        entity: String,
        count: usize,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidEntity(err) => write!(f, "invalid entity: {err}"),
            Self::Query(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "entity not found: {id}"),
            Self::DuplicateIdentifier(id) => write!(f, "entity id already present: {id}"),
            Self::MissingIdentifier => write!(f, "entity has no id; insert it first"),
            Self::IdentifierChanged { expected, found } => match found {
                Some(found) => write!(f, "entity id changed from {expected} to {found}"),
                None => write!(f, "entity id {expected} was cleared"),
            },
            Self::NonUniqueResult { entity, count } => {
                write!(f, "expected at most one {entity}, found {count}")
            }
            Self::InvalidData(message) => write!(f, "invalid entity data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvalidEntity(err) | Self::Query(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EntityValidationError> for RepoError {
    fn from(value: EntityValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<QueryError> for RepoError {
    fn from(value: QueryError) -> Self {
        Self::Query(value)
    }
}

/// Repository interface for one entity type.
///
/// Mutating calls take `&mut self`; callers sharing a store across threads
/// serialize access themselves.
pub trait EntityRepository {
    /// Schema every stored entity conforms to.
    fn schema(&self) -> &EntitySchema;

    /// Stores a copy of `entity` and returns its id, assigning one if absent.
    fn insert(&mut self, entity: &Entity) -> RepoResult<EntityId>;

    /// Snapshot of one entity, or `None` when absent.
    fn find_by_id(&self, id: EntityId) -> Option<Entity>;

    /// Replaces a stored entity, keeping its iteration position.
    fn update(&mut self, entity: &Entity) -> RepoResult<()>;

    /// Removes an entity; `false` when it was not stored.
    fn delete(&mut self, id: EntityId) -> bool;

    fn count(&self) -> usize;

    /// Snapshots of every entity in insertion order.
    fn all(&self) -> Vec<Entity>;

    /// Snapshot of one entity, failing with `NotFound` when absent.
    fn get(&self, id: EntityId) -> RepoResult<Entity> {
        self.find_by_id(id).ok_or(RepoError::NotFound(id))
    }

    fn contains(&self, id: EntityId) -> bool {
        self.find_by_id(id).is_some()
    }
}
