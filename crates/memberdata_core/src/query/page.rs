//! Page requests, pages and the sort-then-slice engine.
//!
//! # Responsibility
//! - Validate zero-based page requests.
//! - Sort a result set, count it, and cut one page out of it.
//!
//! # Invariants
//! - `content.len() <= size` for every page.
//! - `total_pages = ceil(total_elements / size)`.
//! - A page index past the end yields empty content, never an error.

use crate::model::entity::Entity;
use crate::model::schema::EntitySchema;
use crate::query::sort::SortSpec;
use crate::query::{QueryError, QueryResult};
use log::debug;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Validated zero-based page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    index: usize,
    size: usize,
    sort: SortSpec,
}

impl PageRequest {
    /// Creates an unsorted request.
    ///
    /// # Errors
    /// - `InvalidPageRequest` when `index < 0` or `size <= 0`.
    pub fn of(index: i64, size: i64) -> QueryResult<Self> {
        let invalid = || QueryError::InvalidPageRequest { index, size };
        if index < 0 || size <= 0 {
            return Err(invalid());
        }
        Ok(Self {
            index: usize::try_from(index).map_err(|_| invalid())?,
            size: usize::try_from(size).map_err(|_| invalid())?,
            sort: SortSpec::unsorted(),
        })
    }

    /// Creates a sorted request, e.g. `PageRequest::sorted(0, 3, SortSpec::desc("username"))`.
    pub fn sorted(index: i64, size: i64, sort: SortSpec) -> QueryResult<Self> {
        Ok(Self::of(index, size)?.with_sort(sort))
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    /// Number of elements preceding this page, saturating on overflow.
    pub fn offset(&self) -> usize {
        self.index.saturating_mul(self.size)
    }

    /// Request for the following page with the same size and sort.
    pub fn next(&self) -> Self {
        Self {
            index: self.index.saturating_add(1),
            size: self.size,
            sort: self.sort.clone(),
        }
    }
}

/// One bounded slice of a sorted result set plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    content: Vec<T>,
    number: usize,
    size: usize,
    total_elements: usize,
}

impl<T> Page<T> {
    /// Assembles a page; `content` must already be the requested slice.
    ///
    /// # Errors
    /// - `InvalidPageRequest` when `size` is zero or `content` exceeds it.
    pub fn new(
        content: Vec<T>,
        number: usize,
        size: usize,
        total_elements: usize,
    ) -> QueryResult<Self> {
        if size == 0 || content.len() > size {
            return Err(QueryError::InvalidPageRequest {
                index: i64::try_from(number).unwrap_or(i64::MAX),
                size: i64::try_from(size).unwrap_or(i64::MAX),
            });
        }
        Ok(Self {
            content,
            number,
            size,
            total_elements,
        })
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    /// Zero-based page index.
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn total_elements(&self) -> usize {
        self.total_elements
    }

    pub fn total_pages(&self) -> usize {
        self.total_elements.div_ceil(self.size)
    }

    pub fn is_first(&self) -> bool {
        self.number == 0
    }

    pub fn has_next(&self) -> bool {
        self.number + 1 < self.total_pages()
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }

    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }

    /// Converts content while keeping paging metadata, e.g. entity -> DTO.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
        }
    }

    /// Fallible `map`; stops at the first conversion error.
    pub fn try_map<U, E, F>(self, f: F) -> Result<Page<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        Ok(Page {
            content: self.content.into_iter().map(f).collect::<Result<Vec<_>, E>>()?,
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
        })
    }
}

impl<T: Serialize> Serialize for Page<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Page", 8)?;
        state.serialize_field("content", &self.content)?;
        state.serialize_field("number", &self.number)?;
        state.serialize_field("size", &self.size)?;
        state.serialize_field("total_elements", &self.total_elements)?;
        state.serialize_field("total_pages", &self.total_pages())?;
        state.serialize_field("first", &self.is_first())?;
        state.serialize_field("last", &self.is_last())?;
        state.serialize_field("has_next", &self.has_next())?;
        state.end()
    }
}

/// Sorts `entities` and returns page `page_index` of size `page_size`.
///
/// `total_elements` counts the whole input, independent of the slice.
///
/// # Errors
/// - `InvalidPageRequest` when `page_index < 0` or `page_size <= 0`.
/// - `UnknownField` when `sort` names a field `schema` does not declare.
pub fn sort_and_page(
    schema: &EntitySchema,
    entities: Vec<Entity>,
    sort: &SortSpec,
    page_index: i64,
    page_size: i64,
) -> QueryResult<Page<Entity>> {
    let request = PageRequest::sorted(page_index, page_size, sort.clone())?;
    page_of(schema, entities, &request)
}

/// Same as `sort_and_page`, taking an already validated request.
pub fn page_of(
    schema: &EntitySchema,
    mut entities: Vec<Entity>,
    request: &PageRequest,
) -> QueryResult<Page<Entity>> {
    request.sort().validate(schema)?;

    let total_elements = entities.len();
    request.sort().sort(&mut entities);
    let content: Vec<Entity> = entities
        .into_iter()
        .skip(request.offset())
        .take(request.size())
        .collect();

    debug!(
        "event=page module=query status=ok entity={} index={} size={} total={} returned={}",
        schema.name(),
        request.index(),
        request.size(),
        total_elements,
        content.len()
    );
    Page::new(content, request.index(), request.size(), total_elements)
}

#[cfg(test)]
mod tests {
    use super::{Page, PageRequest};
    use crate::query::QueryError;

    #[test]
    fn rejects_negative_index_and_non_positive_size() {
        assert_eq!(
            PageRequest::of(-1, 3).unwrap_err(),
            QueryError::InvalidPageRequest { index: -1, size: 3 }
        );
        assert!(PageRequest::of(0, 0).is_err());
        assert!(PageRequest::of(0, -4).is_err());
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let page: Page<u8> = Page::new(Vec::new(), 0, 10, 0).unwrap();
        assert_eq!(page.total_pages(), 0);
        assert!(page.is_first());
        assert!(!page.has_next());
        assert!(page.is_last());
    }

    #[test]
    fn map_keeps_metadata() {
        let page = Page::new(vec![1, 2], 1, 2, 5).unwrap().map(|n| n * 10);
        assert_eq!(page.content(), &[10, 20]);
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_previous());
        assert!(page.has_next());
        assert!(page.has_content());
        assert_eq!(page.into_content(), vec![10, 20]);
    }

    #[test]
    fn new_rejects_zero_size_and_oversized_content() {
        assert_eq!(
            Page::<u8>::new(Vec::new(), 0, 0, 0).unwrap_err(),
            QueryError::InvalidPageRequest { index: 0, size: 0 }
        );
        assert_eq!(
            Page::new(vec![1, 2, 3], 2, 2, 7).unwrap_err(),
            QueryError::InvalidPageRequest { index: 2, size: 2 }
        );
    }

    #[test]
    fn page_past_the_end_has_no_content() {
        let page: Page<u8> = Page::new(Vec::new(), 4, 3, 5).unwrap();
        assert!(!page.has_content());
        assert_eq!(page.total_pages(), 2);
        assert!(page.is_last());
    }
}
