//! Generic repository use-case service and the bulk mutation engine.
//!
//! # Responsibility
//! - Combine store, predicate and paging primitives into repository-style calls.
//! - Apply bulk mutations with per-entity atomicity.
//!
//! # Invariants
//! - Service APIs never bypass repository validation.
//! - A bulk mutation commits each entity fully or not at all; entities
//!   committed before a failure stay committed.
//! - Snapshots read before a bulk mutation are stale afterwards; re-reading
//!   through the repository always observes the mutation.

use crate::model::entity::{Entity, EntityId};
use crate::query::derived::{DerivedQuery, QuerySubject};
use crate::query::page::{page_of, Page, PageRequest};
use crate::query::predicate::{filter, Operand, Predicate};
use crate::query::sort::SortSpec;
use crate::query::QueryError;
use crate::repo::entity_repo::{EntityRepository, RepoError, RepoResult};
use log::{info, warn};

/// Applies `transform` to every entity of `repo` matching `predicate`.
///
/// Each matching entity is copied, transformed, validated and written back
/// before the next one is touched. Returns how many entities were written.
///
/// # Errors
/// - `Query` when `predicate` does not fit the store schema (nothing written).
/// - The first error returned by `transform` or by the write-back; entities
///   processed earlier remain updated.
/// - `IdentifierChanged` when `transform` alters the entity id.
pub fn bulk_update<R, F>(
    repo: &mut R,
    predicate: &Predicate,
    mut transform: F,
) -> RepoResult<usize>
where
    R: EntityRepository + ?Sized,
    F: FnMut(&mut Entity) -> RepoResult<()>,
{
    let matched = filter(&*repo, predicate)?;
    let matched_count = matched.len();
    let mut updated = 0;

    for original in matched {
        let id = original.id().ok_or_else(|| {
            RepoError::InvalidData("stored entity without id".to_string())
        })?;

        let mut working = original;
        let applied = transform(&mut working).and_then(|()| {
            if working.id() == Some(id) {
                Ok(())
            } else {
                Err(RepoError::IdentifierChanged {
                    expected: id,
                    found: working.id(),
                })
            }
        });
        if let Err(err) = applied.and_then(|()| repo.update(&working)) {
            warn!(
                "event=bulk_update module=service status=error entity={} id={} matched={} updated={} error={}",
                repo.schema().name(),
                id,
                matched_count,
                updated,
                err
            );
            return Err(err);
        }
        updated += 1;
    }

    info!(
        "event=bulk_update module=service status=ok entity={} matched={} updated={}",
        repo.schema().name(),
        matched_count,
        updated
    );
    Ok(updated)
}

/// Use-case service wrapping one entity repository.
pub struct RepositoryService<R: EntityRepository> {
    repo: R,
}

impl<R: EntityRepository> RepositoryService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn into_inner(self) -> R {
        self.repo
    }

    /// Inserts new entities and replaces already stored ones.
    pub fn save(&mut self, entity: &Entity) -> RepoResult<EntityId> {
        match entity.id() {
            Some(id) if self.repo.contains(id) => {
                self.repo.update(entity)?;
                Ok(id)
            }
            _ => self.repo.insert(entity),
        }
    }

    pub fn get(&self, id: EntityId) -> RepoResult<Entity> {
        self.repo.get(id)
    }

    pub fn find_by_id(&self, id: EntityId) -> Option<Entity> {
        self.repo.find_by_id(id)
    }

    pub fn find_all(&self) -> Vec<Entity> {
        self.repo.all()
    }

    pub fn find_all_sorted(&self, sort: &SortSpec) -> RepoResult<Vec<Entity>> {
        self.find_by_sorted(&Predicate::all(), sort)
    }

    /// Entities matching `predicate`, in store order.
    pub fn find_by(&self, predicate: &Predicate) -> RepoResult<Vec<Entity>> {
        Ok(filter(&self.repo, predicate)?)
    }

    pub fn find_by_sorted(
        &self,
        predicate: &Predicate,
        sort: &SortSpec,
    ) -> RepoResult<Vec<Entity>> {
        sort.validate(self.repo.schema())?;
        let mut matched = filter(&self.repo, predicate)?;
        sort.sort(&mut matched);
        Ok(matched)
    }

    /// One page of the entities matching `predicate`.
    pub fn find_page(
        &self,
        predicate: &Predicate,
        request: &PageRequest,
    ) -> RepoResult<Page<Entity>> {
        let matched = filter(&self.repo, predicate)?;
        Ok(page_of(self.repo.schema(), matched, request)?)
    }

    pub fn count(&self) -> usize {
        self.repo.count()
    }

    pub fn count_by(&self, predicate: &Predicate) -> RepoResult<usize> {
        Ok(filter(&self.repo, predicate)?.len())
    }

    pub fn exists_by(&self, predicate: &Predicate) -> RepoResult<bool> {
        Ok(self.count_by(predicate)? > 0)
    }

    pub fn delete(&mut self, id: EntityId) -> bool {
        self.repo.delete(id)
    }

    /// See [`bulk_update`].
    pub fn bulk_update<F>(&mut self, predicate: &Predicate, transform: F) -> RepoResult<usize>
    where
        F: FnMut(&mut Entity) -> RepoResult<()>,
    {
        bulk_update(&mut self.repo, predicate, transform)
    }

    /// Runs a `find...By...` method name against the store.
    ///
    /// # Errors
    /// - `InvalidDerivedQuery` for unparsable names or non-`find` subjects.
    /// - Binding and validation errors from `DerivedQuery::bind`.
    pub fn find_by_derived<I>(&self, method: &str, args: I) -> RepoResult<Vec<Entity>>
    where
        I: IntoIterator<Item = Operand>,
    {
        let predicate = self.bind_derived(method, QuerySubject::Find, args)?;
        self.find_by(&predicate)
    }

    /// Runs a `count...By...` method name against the store.
    pub fn count_by_derived<I>(&self, method: &str, args: I) -> RepoResult<usize>
    where
        I: IntoIterator<Item = Operand>,
    {
        let predicate = self.bind_derived(method, QuerySubject::Count, args)?;
        self.count_by(&predicate)
    }

    /// Runs an `exists...By...` method name against the store.
    pub fn exists_by_derived<I>(&self, method: &str, args: I) -> RepoResult<bool>
    where
        I: IntoIterator<Item = Operand>,
    {
        let predicate = self.bind_derived(method, QuerySubject::Exists, args)?;
        self.exists_by(&predicate)
    }

    fn bind_derived<I>(
        &self,
        method: &str,
        subject: QuerySubject,
        args: I,
    ) -> RepoResult<Predicate>
    where
        I: IntoIterator<Item = Operand>,
    {
        let query = DerivedQuery::parse(method)?;
        if query.subject() != subject {
            return Err(QueryError::InvalidDerivedQuery(method.to_string()).into());
        }
        Ok(query.bind(self.repo.schema(), args)?)
    }
}
