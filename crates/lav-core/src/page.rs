//! Paginator: fixed-size windows over an ordered list.

use serde::Serialize;

/// One page of an ordered sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// 1-based number of this page.
    pub page_number: usize,
    pub total_pages: usize,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn is_last(&self) -> bool {
        self.page_number == self.total_pages
    }
}

/// Number of pages needed for `len` items.
pub fn page_count(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1))
}

/// Slice `items` into pages of `page_size` and return page `page_number`.
///
/// Out-of-range page numbers clamp to the first or last page. A `page_size`
/// of zero is treated as one. An empty input has no page at all.
pub fn paginate<T>(items: Vec<T>, page_number: usize, page_size: usize) -> Option<Page<T>> {
    if items.is_empty() {
        return None;
    }
    let page_size = page_size.max(1);
    let total_pages = page_count(items.len(), page_size);
    let page_number = page_number.clamp(1, total_pages);
    let start = (page_number - 1) * page_size;
    let items = items.into_iter().skip(start).take(page_size).collect();
    Some(Page {
        page_number,
        total_pages,
        items,
    })
}
