//! Pagination utilities for the resource listing

/// Default page size
pub const DEFAULT_PER_PAGE: usize = 20;

/// Largest accepted page size
pub const MAX_PER_PAGE: usize = 100;

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: usize,
    /// Items per page, within [1, MAX_PER_PAGE]
    pub per_page: usize,
    /// Total number of pages, at least 1
    pub total_pages: usize,
    /// Index of the first item on the page
    pub offset: usize,
}

impl Pagination {
    /// The page's slice of `items` (empty past the last page)
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset.min(items.len());
        let end = self.offset.saturating_add(self.per_page).min(items.len());
        &items[start..end]
    }
}

/// Calculate pagination metadata
///
/// `requested_page` is raised to 1 but never lowered to the last page, so a
/// page past the end yields an empty slice. `per_page` is clamped to
/// [1, MAX_PER_PAGE].
///
/// # Examples
/// ```
/// use refcat_web::pagination::calculate_pagination;
///
/// // 45 results at 20 per page = 3 pages (20 + 20 + 5)
/// let p = calculate_pagination(45, 3, 20);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 40);
/// ```
pub fn calculate_pagination(total_results: usize, requested_page: usize, per_page: usize) -> Pagination {
    let per_page = per_page.clamp(1, MAX_PER_PAGE);
    let total_pages = total_results.div_ceil(per_page).max(1);
    let page = requested_page.max(1);
    let offset = (page - 1).saturating_mul(per_page);

    Pagination {
        page,
        per_page,
        total_pages,
        offset,
    }
}
