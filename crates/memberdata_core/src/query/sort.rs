//! Multi-key ordering of entity snapshots.

use crate::model::entity::Entity;
use crate::model::schema::EntitySchema;
use crate::query::QueryResult;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub field: String,
    pub direction: Direction,
}

/// Ordered sort keys; earlier keys take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    orders: Vec<SortOrder>,
}

impl SortSpec {
    /// Keeps input order.
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(field: impl Into<String>, direction: Direction) -> Self {
        Self::unsorted().then(field, direction)
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::by(field, Direction::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::by(field, Direction::Desc)
    }

    /// Appends a lower-priority key.
    pub fn then(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.orders.push(SortOrder {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn orders(&self) -> &[SortOrder] {
        &self.orders
    }

    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }

    /// Fails with `UnknownField` for keys the schema does not declare.
    pub fn validate(&self, schema: &EntitySchema) -> QueryResult<()> {
        self.orders
            .iter()
            .try_for_each(|order| schema.require_field(&order.field).map(|_| ()))
    }

    /// Compares two entities key by key.
    ///
    /// Null sorts before any value in ascending order and after it in
    /// descending order.
    pub fn compare(&self, left: &Entity, right: &Entity) -> Ordering {
        for order in &self.orders {
            let ordering = match (left.get(&order.field), right.get(&order.field)) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(a), Some(b)) => a.compare(b).unwrap_or(Ordering::Equal),
            };
            let ordering = match order.direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Stable in-place sort; ties keep their incoming order.
    pub fn sort(&self, entities: &mut [Entity]) {
        if self.is_unsorted() {
            return;
        }
        entities.sort_by(|left, right| self.compare(left, right));
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, SortSpec};
    use crate::model::entity::Entity;

    #[test]
    fn ties_keep_input_order() {
        let mut entities = vec![
            Entity::new().with("age", 10).with("username", "b"),
            Entity::new().with("age", 5).with("username", "a"),
            Entity::new().with("age", 10).with("username", "c"),
        ];
        SortSpec::desc("age").sort(&mut entities);
        let names: Vec<_> = entities.iter().filter_map(|e| e.text("username")).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }

    #[test]
    fn secondary_key_breaks_ties_and_null_sorts_first() {
        let mut entities = vec![
            Entity::new().with("age", 10).with("username", "z"),
            Entity::new().with("username", "n"),
            Entity::new().with("age", 10).with("username", "a"),
        ];
        SortSpec::asc("age")
            .then("username", Direction::Asc)
            .sort(&mut entities);
        let names: Vec<_> = entities.iter().filter_map(|e| e.text("username")).collect();
        assert_eq!(names, vec!["n", "a", "z"]);
    }
}
