//! Pagination
//!
//! Windowing of ordered result sets shared by every module's query side.
//!
//! Callers pass `page`/`results` straight from the request without
//! validation; every entry point here applies the same clamping:
//! - `page <= 0` is read as `1`
//! - `results <= 0` is read as [`DEFAULT_RESULTS`]
//! - `results > MAX_RESULTS` is read as [`MAX_RESULTS`]
//!
//! ## Examples
//! ```rust
//! use kernel::pagination::paginate;
//!
//! let paged = paginate(0..25, 3, 10);
//! assert_eq!(paged.items(), &[20, 21, 22, 23, 24]);
//! assert_eq!(paged.total_pages(), 3);
//! ```

use serde::{Deserialize, Serialize};

/// Page size used when the caller asks for zero or fewer results.
pub const DEFAULT_RESULTS: u64 = 10;

/// Upper bound on the page size.
pub const MAX_RESULTS: u64 = 100;

/// Raw paging parameters as supplied by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PagedQuery {
    pub page: i64,
    pub results: i64,
}

impl PagedQuery {
    pub fn new(page: i64, results: i64) -> Self {
        Self { page, results }
    }
}

impl Default for PagedQuery {
    fn default() -> Self {
        Self {
            page: 1,
            results: DEFAULT_RESULTS as i64,
        }
    }
}

/// Anything that carries paging parameters, e.g. a module's browse query.
pub trait PageRequest {
    fn page(&self) -> i64;

    fn results(&self) -> i64;

    fn window(&self) -> PageWindow {
        PageWindow::new(self.page(), self.results())
    }
}

impl PageRequest for PagedQuery {
    fn page(&self) -> i64 {
        self.page
    }

    fn results(&self) -> i64 {
        self.results
    }
}

/// Clamped paging parameters.
///
/// Storage-backed queries use [`offset`](Self::offset) and
/// [`limit`](Self::limit) to push the window down to the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    page: u64,
    results: u64,
}

impl PageWindow {
    pub fn new(page: i64, results: i64) -> Self {
        let page = if page <= 0 { 1 } else { page as u64 };
        let results = match results {
            r if r <= 0 => DEFAULT_RESULTS,
            r if r as u64 > MAX_RESULTS => MAX_RESULTS,
            r => r as u64,
        };
        Self { page, results }
    }

    /// 1-based page number
    pub fn page(&self) -> u64 {
        self.page
    }

    /// Effective page size
    pub fn results(&self) -> u64 {
        self.results
    }

    /// Number of items to skip. Saturates for absurd page numbers.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.results)
    }

    pub fn limit(&self) -> u64 {
        self.results
    }

    /// Ceiling division, with a single page whenever everything fits on one.
    pub fn total_pages(&self, total_count: u64) -> u64 {
        if total_count <= self.results {
            1
        } else {
            total_count.div_ceil(self.results)
        }
    }

    fn apply<I: Iterator>(&self, iter: I) -> Vec<I::Item> {
        let skip = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(self.limit()).unwrap_or(usize::MAX);
        iter.skip(skip).take(take).collect()
    }
}

impl From<PagedQuery> for PageWindow {
    fn from(query: PagedQuery) -> Self {
        query.window()
    }
}

/// One page of an ordered result set plus paging metadata.
///
/// Serialized as `{items, page, pageSize, totalPages, totalCount}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
    items: Vec<T>,
    page: u64,
    page_size: u64,
    total_pages: u64,
    total_count: u64,
}

impl<T> Paged<T> {
    /// Build a page from items already windowed by `window`.
    pub fn from_window(items: Vec<T>, window: PageWindow, total_count: u64) -> Self {
        Self {
            items,
            page: window.page(),
            page_size: window.results(),
            total_pages: window.total_pages(total_count),
            total_count,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn total_pages(&self) -> u64 {
        self.total_pages
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Convert the items, keeping the metadata (entity → DTO).
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
            total_count: self.total_count,
        }
    }
}

/// Window an ordered sequence and report paging metadata.
pub fn paginate<I>(sequence: I, page: i64, results: i64) -> Paged<I::Item>
where
    I: IntoIterator,
    I::IntoIter: ExactSizeIterator,
{
    let window = PageWindow::new(page, results);
    let iter = sequence.into_iter();
    let total_count = iter.len() as u64;
    Paged::from_window(window.apply(iter), window, total_count)
}

/// [`paginate`] driven by a query object.
pub fn paginate_query<I, Q>(sequence: I, query: &Q) -> Paged<I::Item>
where
    I: IntoIterator,
    I::IntoIter: ExactSizeIterator,
    Q: PageRequest + ?Sized,
{
    paginate(sequence, query.page(), query.results())
}

/// Window an ordered sequence without counting it.
pub fn skip_and_take<I>(sequence: I, page: i64, results: i64) -> Vec<I::Item>
where
    I: IntoIterator,
{
    PageWindow::new(page, results).apply(sequence.into_iter())
}

/// [`skip_and_take`] driven by a query object.
pub fn skip_and_take_query<I, Q>(sequence: I, query: &Q) -> Vec<I::Item>
where
    I: IntoIterator,
    Q: PageRequest + ?Sized,
{
    skip_and_take(sequence, query.page(), query.results())
}
