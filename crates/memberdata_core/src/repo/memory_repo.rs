//! Map-backed in-memory entity store.
//!
//! # Responsibility
//! - Own entity records for one schema, keyed by `EntityId`.
//! - Preserve insertion order for iteration.
//!
//! # Invariants
//! - `index` and `rows` always describe the same set of entities.
//! - Sequence numbers only grow; updates keep the original sequence.
//! - Every stored entity has an id and passes `EntitySchema::check_entity`.

use crate::model::entity::{Entity, EntityId};
use crate::model::schema::EntitySchema;
use crate::repo::entity_repo::{EntityRepository, RepoError, RepoResult};
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// In-memory store bound to one entity schema.
#[derive(Debug, Clone)]
pub struct InMemoryEntityStore {
    schema: EntitySchema,
    rows: BTreeMap<u64, Entity>,
    index: HashMap<EntityId, u64>,
    next_seq: u64,
}

impl InMemoryEntityStore {
    pub fn new(schema: EntitySchema) -> Self {
        Self {
            schema,
            rows: BTreeMap::new(),
            index: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Identifiers in insertion order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.rows.values().filter_map(Entity::id).collect()
    }

    fn check(&self, entity: &Entity) -> RepoResult<()> {
        entity.validate()?;
        self.schema
            .check_entity(entity)
            .map_err(RepoError::InvalidEntity)
    }

    fn fresh_id(&self) -> EntityId {
        loop {
            let id = Uuid::new_v4();
            if !self.index.contains_key(&id) {
                return id;
            }
        }
    }
}

impl EntityRepository for InMemoryEntityStore {
    fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    fn insert(&mut self, entity: &Entity) -> RepoResult<EntityId> {
        if let Err(err) = self.check(entity) {
            warn!(
                "event=insert module=repo status=error entity={} error={}",
                self.schema.name(),
                err
            );
            return Err(err);
        }

        let id = match entity.id() {
            Some(id) if self.index.contains_key(&id) => {
                warn!(
                    "event=insert module=repo status=error entity={} error_code=duplicate_id id={}",
                    self.schema.name(),
                    id
                );
                return Err(RepoError::DuplicateIdentifier(id));
            }
            Some(id) => id,
            None => self.fresh_id(),
        };

        let mut stored = entity.clone();
        stored.assign_id(id);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.rows.insert(seq, stored);
        self.index.insert(id, seq);

        debug!(
            "event=insert module=repo status=ok entity={} id={} count={}",
            self.schema.name(),
            id,
            self.rows.len()
        );
        Ok(id)
    }

    fn find_by_id(&self, id: EntityId) -> Option<Entity> {
        let seq = self.index.get(&id)?;
        self.rows.get(seq).cloned()
    }

    fn update(&mut self, entity: &Entity) -> RepoResult<()> {
        let id = entity.id().ok_or(RepoError::MissingIdentifier)?;
        self.check(entity)?;

        let seq = *self.index.get(&id).ok_or(RepoError::NotFound(id))?;
        let slot = self.rows.get_mut(&seq).ok_or_else(|| {
            RepoError::InvalidData(format!("index points at missing row {seq} for {id}"))
        })?;
        *slot = entity.clone();

        debug!(
            "event=update module=repo status=ok entity={} id={}",
            self.schema.name(),
            id
        );
        Ok(())
    }

    fn delete(&mut self, id: EntityId) -> bool {
        let Some(seq) = self.index.remove(&id) else {
            debug!(
                "event=delete module=repo status=miss entity={} id={}",
                self.schema.name(),
                id
            );
            return false;
        };
        self.rows.remove(&seq);
        debug!(
            "event=delete module=repo status=ok entity={} id={} count={}",
            self.schema.name(),
            id,
            self.rows.len()
        );
        true
    }

    fn count(&self) -> usize {
        self.rows.len()
    }

    fn all(&self) -> Vec<Entity> {
        self.rows.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryEntityStore;
    use crate::model::entity::Entity;
    use crate::model::schema::EntitySchema;
    use crate::model::value::FieldType;
    use crate::repo::entity_repo::{EntityRepository, RepoError};

    fn store() -> InMemoryEntityStore {
        InMemoryEntityStore::new(
            EntitySchema::new("Team", [("name", FieldType::Text)]).unwrap(),
        )
    }

    #[test]
    fn ids_follow_insertion_order_and_skip_deleted_rows() {
        let mut store = store();
        let a = store.insert(&Entity::new().with("name", "a")).unwrap();
        let b = store.insert(&Entity::new().with("name", "b")).unwrap();
        let c = store.insert(&Entity::new().with("name", "c")).unwrap();

        assert!(store.delete(b));

        assert_eq!(store.ids(), vec![a, c]);
    }

    #[test]
    fn update_keeps_iteration_position() {
        let mut store = store();
        let a = store.insert(&Entity::new().with("name", "a")).unwrap();
        store.insert(&Entity::new().with("name", "b")).unwrap();

        let mut renamed = store.get(a).unwrap();
        renamed.set("name", "a2");
        store.update(&renamed).unwrap();

        let names: Vec<_> = store
            .all()
            .iter()
            .filter_map(|e| e.text("name").map(str::to_string))
            .collect();
        assert_eq!(names, vec!["a2", "b"]);
    }

    #[test]
    fn update_requires_stored_id() {
        let mut store = store();
        let err = store.update(&Entity::new().with("name", "x")).unwrap_err();
        assert_eq!(err, RepoError::MissingIdentifier);
    }
}
