//! Query layer: predicates, derived-query parsing, sorting and paging.
//!
//! # Responsibility
//! - Turn caller intent into validated, schema-checked query values.
//! - Evaluate those values against repository snapshots.
//!
//! # Invariants
//! - A `Predicate` or `SortSpec` that reached evaluation has been checked
//!   against the schema of the store it runs on.
//! - Query evaluation never mutates the store.

use crate::model::value::FieldType;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod derived;
pub mod page;
pub mod predicate;
pub mod sort;

pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised while building or validating a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    UnknownField {
        entity: String,
        field: String,
    },
    TypeMismatch {
        field: String,
        expected: FieldType,
        found: FieldType,
    },
    UnsupportedOperator {
        field: String,
        operator: predicate::Operator,
        field_type: FieldType,
    },
    InvalidOperand {
        field: String,
        operator: predicate::Operator,
    },
    InvalidPageRequest {
        index: i64,
        size: i64,
    },
    InvalidDerivedQuery(String),
    ArgumentCount {
        method: String,
        expected: usize,
        found: usize,
    },
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField { entity, field } => {
                write!(f, "unknown field `{field}` on entity `{entity}`")
            }
            Self::TypeMismatch {
                field,
                expected,
                found,
            } => write!(
                f,
                "type mismatch on `{field}`: expected {expected}, found {found}"
            ),
            Self::UnsupportedOperator {
                field,
                operator,
                field_type,
            } => write!(
                f,
                "operator {operator} is not supported on {field_type} field `{field}`"
            ),
            Self::InvalidOperand { field, operator } => {
                if *operator == predicate::Operator::In {
                    write!(f, "operator in on `{field}` needs a list of values")
                } else {
                    write!(f, "operator {operator} on `{field}` needs a single value")
                }
            }
            Self::InvalidPageRequest { index, size } => write!(
                f,
                "invalid page request: index={index} size={size}; index must be >= 0 and size > 0"
            ),
            Self::InvalidDerivedQuery(name) => write!(f, "cannot derive a query from `{name}`"),
            Self::ArgumentCount {
                method,
                expected,
                found,
            } => write!(
                f,
                "`{method}` expects {expected} argument(s), got {found}"
            ),
        }
    }
}

impl Error for QueryError {}
