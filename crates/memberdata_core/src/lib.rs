//! Core data-access logic for memberdata.
//! Typed entity stores, predicate queries, paging and bulk mutation.

pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use logging::{
    default_log_level, init_logging, init_logging_with, logging_status, LoggingConfig,
    LoggingError,
};
pub use model::entity::{Entity, EntityId, EntityValidationError};
pub use model::schema::{EntitySchema, FieldDef, SchemaError};
pub use model::value::{FieldType, FieldValue};
pub use query::derived::{Criterion, DerivedQuery, QuerySubject};
pub use query::page::{page_of, sort_and_page, Page, PageRequest};
pub use query::predicate::{
    evaluate, filter, Comparison, Operand, Operator, Predicate, PredicateBuilder,
};
pub use query::sort::{Direction, SortOrder, SortSpec};
pub use query::{QueryError, QueryResult};
pub use repo::entity_repo::{EntityRepository, RepoError, RepoResult};
pub use repo::memory_repo::InMemoryEntityStore;
pub use service::member_service::{
    member_schema, team_schema, Member, MemberDto, MemberRepositoryCustom, MemberService, Team,
};
pub use service::repository_service::{bulk_update, RepositoryService};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
