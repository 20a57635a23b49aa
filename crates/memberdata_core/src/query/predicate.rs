//! Field predicates and their evaluation.
//!
//! # Responsibility
//! - Represent `findByXAndYGreaterThan`-style filters as plain data.
//! - Validate filters against a schema before they touch a store.
//! - Filter repository snapshots in store iteration order.
//!
//! # Invariants
//! - A predicate is a conjunction; the empty conjunction matches everything.
//! - A null (absent) field never satisfies a comparison.
//! - `In` always carries a list operand, every other operator a single value.

use crate::model::entity::Entity;
use crate::model::schema::EntitySchema;
use crate::model::value::FieldValue;
use crate::query::{QueryError, QueryResult};
use crate::repo::entity_repo::EntityRepository;
use log::debug;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Comparison operator of one predicate clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    In,
}

impl Operator {
    fn requires_order(self) -> bool {
        !matches!(self, Self::Equals | Self::In)
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Self::Equals => "=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::In => "in",
        };
        f.write_str(symbol)
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Value(FieldValue),
    List(Vec<FieldValue>),
}

impl Operand {
    fn values(&self) -> &[FieldValue] {
        match self {
            Self::Value(value) => std::slice::from_ref(value),
            Self::List(values) => values.as_slice(),
        }
    }
}

impl From<FieldValue> for Operand {
    fn from(value: FieldValue) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Operand {
    fn from(value: &str) -> Self {
        Self::Value(value.into())
    }
}

impl From<String> for Operand {
    fn from(value: String) -> Self {
        Self::Value(value.into())
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Self::Value(value.into())
    }
}

impl From<i32> for Operand {
    fn from(value: i32) -> Self {
        Self::Value(value.into())
    }
}

impl From<Vec<FieldValue>> for Operand {
    fn from(values: Vec<FieldValue>) -> Self {
        Self::List(values)
    }
}

/// One `field <op> operand` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    field: String,
    operator: Operator,
    operand: Operand,
}

impl Comparison {
    /// Creates a clause after checking that operand shape fits the operator.
    ///
    /// Field existence and literal types are checked later against a schema.
    pub fn new(
        field: impl Into<String>,
        operator: Operator,
        operand: impl Into<Operand>,
    ) -> QueryResult<Self> {
        let field = field.into();
        let operand = operand.into();
        let shape_ok = match (&operator, &operand) {
            (Operator::In, Operand::List(_)) => true,
            (Operator::In, Operand::Value(_)) => false,
            (_, Operand::Value(_)) => true,
            (_, Operand::List(_)) => false,
        };
        if !shape_ok {
            return Err(QueryError::InvalidOperand { field, operator });
        }
        Ok(Self {
            field,
            operator,
            operand,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    fn validate(&self, schema: &EntitySchema) -> QueryResult<()> {
        let field_type = schema.require_field(&self.field)?;
        if self.operator.requires_order() && !field_type.is_ordered() {
            return Err(QueryError::UnsupportedOperator {
                field: self.field.clone(),
                operator: self.operator,
                field_type,
            });
        }
        for literal in self.operand.values() {
            let found = literal.field_type();
            if found != field_type {
                return Err(QueryError::TypeMismatch {
                    field: self.field.clone(),
                    expected: field_type,
                    found,
                });
            }
        }
        Ok(())
    }

    fn matches(&self, entity: &Entity) -> bool {
        let Some(actual) = entity.get(&self.field) else {
            return false;
        };
        match (&self.operator, &self.operand) {
            (Operator::In, Operand::List(values)) => values.contains(actual),
            (Operator::Equals, Operand::Value(expected)) => actual == expected,
            (operator, Operand::Value(expected)) => {
                let Some(ordering) = actual.compare(expected) else {
                    return false;
                };
                match operator {
                    Operator::GreaterThan => ordering == Ordering::Greater,
                    Operator::GreaterThanOrEqual => ordering != Ordering::Less,
                    Operator::LessThan => ordering == Ordering::Less,
                    Operator::LessThanOrEqual => ordering != Ordering::Greater,
                    Operator::Equals | Operator::In => false,
                }
            }
            _ => false,
        }
    }
}

/// Conjunction of comparisons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    clauses: Vec<Comparison>,
}

impl Predicate {
    /// Matches every entity.
    pub fn all() -> Self {
        Self::default()
    }

    /// Starts a schema-checked builder.
    pub fn builder(schema: &EntitySchema) -> PredicateBuilder<'_> {
        PredicateBuilder {
            schema,
            clauses: Vec::new(),
            error: None,
        }
    }

    /// Wraps pre-built clauses without validating them.
    pub fn from_clauses(clauses: Vec<Comparison>) -> Self {
        Self { clauses }
    }

    pub fn clauses(&self) -> &[Comparison] {
        &self.clauses
    }

    /// Logical AND of two predicates.
    pub fn and(mut self, other: Predicate) -> Self {
        self.clauses.extend(other.clauses);
        self
    }

    /// Checks every clause against `schema`.
    ///
    /// # Errors
    /// - `UnknownField` when a clause names an undeclared field.
    /// - `TypeMismatch` when a literal type differs from the field type.
    /// - `UnsupportedOperator` for ordering comparisons on reference fields.
    pub fn validate(&self, schema: &EntitySchema) -> QueryResult<()> {
        self.clauses
            .iter()
            .try_for_each(|clause| clause.validate(schema))
    }
}

/// Builder that validates each clause as it is added.
///
/// The first failure is kept and reported by `build`.
pub struct PredicateBuilder<'s> {
    schema: &'s EntitySchema,
    clauses: Vec<Comparison>,
    error: Option<QueryError>,
}

impl PredicateBuilder<'_> {
    pub fn eq(self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.push(field, Operator::Equals, Operand::Value(value.into()))
    }

    pub fn gt(self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.push(field, Operator::GreaterThan, Operand::Value(value.into()))
    }

    pub fn gte(self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.push(
            field,
            Operator::GreaterThanOrEqual,
            Operand::Value(value.into()),
        )
    }

    pub fn lt(self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.push(field, Operator::LessThan, Operand::Value(value.into()))
    }

    pub fn lte(self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.push(
            field,
            Operator::LessThanOrEqual,
            Operand::Value(value.into()),
        )
    }

    pub fn is_in<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.push(field, Operator::In, Operand::List(values))
    }

    pub fn build(self) -> QueryResult<Predicate> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(Predicate {
                clauses: self.clauses,
            }),
        }
    }

    fn push(mut self, field: &str, operator: Operator, operand: Operand) -> Self {
        if self.error.is_some() {
            return self;
        }
        let clause = Comparison::new(field, operator, operand)
            .and_then(|clause| clause.validate(self.schema).map(|()| clause));
        match clause {
            Ok(clause) => self.clauses.push(clause),
            Err(err) => self.error = Some(err),
        }
        self
    }
}

/// Returns whether `entity` satisfies every clause of `predicate`.
///
/// The predicate is assumed to be validated for the entity's schema.
pub fn evaluate(predicate: &Predicate, entity: &Entity) -> bool {
    predicate.clauses.iter().all(|clause| clause.matches(entity))
}

/// Returns the entities of `repo` matching `predicate`, in store order.
///
/// # Errors
/// - Propagates `Predicate::validate` failures for the store schema.
pub fn filter<R>(repo: &R, predicate: &Predicate) -> QueryResult<Vec<Entity>>
where
    R: EntityRepository + ?Sized,
{
    predicate.validate(repo.schema())?;

    let snapshot = repo.all();
    let scanned = snapshot.len();
    let matched: Vec<Entity> = snapshot
        .into_iter()
        .filter(|entity| evaluate(predicate, entity))
        .collect();

    debug!(
        "event=filter module=query status=ok entity={} clauses={} scanned={} matched={}",
        repo.schema().name(),
        predicate.clauses.len(),
        scanned,
        matched.len()
    );
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::{evaluate, Comparison, Operator, Predicate};
    use crate::model::entity::Entity;
    use crate::model::schema::EntitySchema;
    use crate::model::value::{FieldType, FieldValue};
    use crate::query::QueryError;
    use uuid::Uuid;

    fn schema() -> EntitySchema {
        EntitySchema::new(
            "Member",
            [
                ("username", FieldType::Text),
                ("age", FieldType::Integer),
                ("team", FieldType::Reference),
            ],
        )
        .unwrap()
    }

    #[test]
    fn builder_reports_first_error() {
        let err = Predicate::builder(&schema())
            .eq("nickname", "aaa")
            .gt("age", "ten")
            .build()
            .unwrap_err();
        assert!(matches!(err, QueryError::UnknownField { field, .. } if field == "nickname"));
    }

    #[test]
    fn ordering_on_reference_is_rejected() {
        let err = Predicate::builder(&schema())
            .gt("team", Uuid::new_v4())
            .build()
            .unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedOperator { .. }));
    }

    #[test]
    fn in_requires_list_operand() {
        assert!(Comparison::new("age", Operator::In, 3).is_err());
        assert!(Comparison::new("age", Operator::Equals, vec![FieldValue::from(3)]).is_err());
    }

    #[test]
    fn null_field_never_matches() {
        let predicate = Predicate::builder(&schema())
            .lte("age", 100)
            .build()
            .unwrap();
        let no_age = Entity::new().with("username", "x");
        assert!(!evaluate(&predicate, &no_age));
        assert!(evaluate(&Predicate::all(), &no_age));
    }

    #[test]
    fn range_operators_are_inclusive_or_exclusive_as_named() {
        let entity = Entity::new().with("age", 20);
        let s = schema();
        let check = |op: Operator| {
            let predicate =
                Predicate::from_clauses(vec![Comparison::new("age", op, 20).unwrap()]);
            predicate.validate(&s).unwrap();
            evaluate(&predicate, &entity)
        };
        assert!(check(Operator::GreaterThanOrEqual));
        assert!(check(Operator::LessThanOrEqual));
        assert!(check(Operator::Equals));
        assert!(!check(Operator::GreaterThan));
        assert!(!check(Operator::LessThan));
    }
}
