//! Derived queries: repository method names parsed into predicates.
//!
//! # Responsibility
//! - Parse names such as `findByUsernameAndAgeGreaterThan` into criteria.
//! - Bind positional arguments to those criteria, yielding a `Predicate`.
//!
//! # Invariants
//! - Parsing is purely syntactic; field existence is checked at `bind`.
//! - Criteria are joined with AND only.

use crate::model::schema::EntitySchema;
use crate::query::predicate::{Comparison, Operand, Operator, Predicate};
use crate::query::{QueryError, QueryResult};
use once_cell::sync::Lazy;
use regex::Regex;

static DERIVED_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(find|read|get|query|count|exists)([A-Z][A-Za-z0-9]*?)?By([A-Z][A-Za-z0-9]*)$")
        .expect("valid derived query regex")
});

/// Longest suffix first so `GreaterThanEqual` wins over `GreaterThan`.
const OPERATOR_SUFFIXES: &[(&str, Operator)] = &[
    ("GreaterThanEqual", Operator::GreaterThanOrEqual),
    ("LessThanEqual", Operator::LessThanOrEqual),
    ("GreaterThan", Operator::GreaterThan),
    ("LessThan", Operator::LessThan),
    ("Equals", Operator::Equals),
    ("In", Operator::In),
    ("Is", Operator::Equals),
];

/// Camel-case words with no supported meaning in a method name.
const UNSUPPORTED_WORDS: &[&str] = &["Or", "Null", "Distinct", "Not", "Like", "Between"];

/// What a derived query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuerySubject {
    Find,
    Count,
    Exists,
}

/// One `(field, operator)` pair awaiting an argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    pub field: String,
    pub operator: Operator,
}

/// Parsed form of a derived-query method name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedQuery {
    method: String,
    subject: QuerySubject,
    criteria: Vec<Criterion>,
}

impl DerivedQuery {
    /// Parses a method name.
    ///
    /// Anything between the verb and `By` is ignored, so `findListByUsername`
    /// and `findOptionalByUsername` parse like `findByUsername`.
    ///
    /// # Errors
    /// - `InvalidDerivedQuery` when the name has no `<verb>...By<Criteria>` shape,
    ///   a criterion is empty, or it uses an unsupported keyword such as `Or`,
    ///   `IsNull` or `Distinct`.
    pub fn parse(method: &str) -> QueryResult<Self> {
        let invalid = || QueryError::InvalidDerivedQuery(method.to_string());
        let captures = DERIVED_NAME_RE.captures(method).ok_or_else(invalid)?;

        let qualifier = captures.get(2).map_or("", |m| m.as_str());
        if camel_words(qualifier)
            .chain(camel_words(&captures[3]))
            .any(|word| UNSUPPORTED_WORDS.contains(&word))
        {
            return Err(invalid());
        }

        let subject = match &captures[1] {
            "count" => QuerySubject::Count,
            "exists" => QuerySubject::Exists,
            _ => QuerySubject::Find,
        };

        let criteria = split_on_and(&captures[3])
            .into_iter()
            .map(parse_criterion)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(invalid)?;

        Ok(Self {
            method: method.to_string(),
            subject,
            criteria,
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn subject(&self) -> QuerySubject {
        self.subject
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    /// Binds one argument per criterion and validates the result.
    ///
    /// # Errors
    /// - `ArgumentCount` when `args` does not match the criteria count.
    /// - `InvalidOperand` when an `In` criterion gets a single value or the reverse.
    /// - Any `Predicate::validate` failure for `schema`.
    pub fn bind<I>(&self, schema: &EntitySchema, args: I) -> QueryResult<Predicate>
    where
        I: IntoIterator<Item = Operand>,
    {
        let args: Vec<Operand> = args.into_iter().collect();
        if args.len() != self.criteria.len() {
            return Err(QueryError::ArgumentCount {
                method: self.method.clone(),
                expected: self.criteria.len(),
                found: args.len(),
            });
        }

        let clauses = self
            .criteria
            .iter()
            .zip(args)
            .map(|(criterion, arg)| {
                Comparison::new(criterion.field.as_str(), criterion.operator, arg)
            })
            .collect::<QueryResult<Vec<_>>>()?;

        let predicate = Predicate::from_clauses(clauses);
        predicate.validate(schema)?;
        Ok(predicate)
    }
}

/// Splits `UsernameOrAge` into `Username`, `Or`, `Age`.
fn camel_words(name: &str) -> impl Iterator<Item = &str> {
    let mut starts: Vec<usize> = name
        .char_indices()
        .filter(|(at, c)| *at == 0 || c.is_ascii_uppercase())
        .map(|(at, _)| at)
        .collect();
    starts.push(name.len());
    starts
        .windows(2)
        .map(|bounds| &name[bounds[0]..bounds[1]])
        .collect::<Vec<_>>()
        .into_iter()
}

fn split_on_and(criteria: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut search_from = 0;
    while let Some(offset) = criteria[search_from..].find("And") {
        let at = search_from + offset;
        let next = criteria[at + 3..].chars().next();
        if at > start && next.is_some_and(|c| c.is_ascii_uppercase()) {
            parts.push(&criteria[start..at]);
            start = at + 3;
        }
        search_from = at + 3;
    }
    parts.push(&criteria[start..]);
    parts
}

fn parse_criterion(part: &str) -> Option<Criterion> {
    let (property, operator) = OPERATOR_SUFFIXES
        .iter()
        .find_map(|(suffix, operator)| {
            part.strip_suffix(*suffix)
                .filter(|rest| !rest.is_empty())
                .map(|rest| (rest, *operator))
        })
        .unwrap_or((part, Operator::Equals));

    let mut chars = property.chars();
    let first = chars.next()?;
    if !first.is_ascii_uppercase() {
        return None;
    }
    let field = first.to_ascii_lowercase().to_string() + chars.as_str();
    Some(Criterion { field, operator })
}

#[cfg(test)]
mod tests {
    use super::{camel_words, split_on_and, DerivedQuery, QuerySubject};
    use crate::query::predicate::Operator;

    #[test]
    fn splits_only_on_capitalised_and() {
        assert_eq!(split_on_and("UsernameAndAge"), vec!["Username", "Age"]);
        assert_eq!(split_on_and("Brandname"), vec!["Brandname"]);
        assert_eq!(split_on_and("HandAndAge"), vec!["Hand", "Age"]);
    }

    #[test]
    fn parses_operator_suffixes() {
        let query = DerivedQuery::parse("countByAgeGreaterThanEqual").unwrap();
        assert_eq!(query.subject(), QuerySubject::Count);
        assert_eq!(query.criteria()[0].field, "age");
        assert_eq!(query.criteria()[0].operator, Operator::GreaterThanOrEqual);
    }

    #[test]
    fn rejects_names_without_criteria() {
        assert!(DerivedQuery::parse("findAll").is_err());
        assert!(DerivedQuery::parse("findBy").is_err());
        assert!(DerivedQuery::parse("deleteByUsername").is_err());
    }

    #[test]
    fn camel_words_split_on_capitals() {
        let words: Vec<_> = camel_words("UsernameOrAge").collect();
        assert_eq!(words, vec!["Username", "Or", "Age"]);
        assert_eq!(camel_words("").count(), 0);
    }
}
