//! Slicing of in-memory collections into pages.
//!
//! [`paginate`] is a pure function over a slice; [`PageCursor`] holds the
//! page a view is currently on and keeps it within the valid range.

use serde::Serialize;

/// Page sizes offered to the operator.
pub const PAGE_SIZE_OPTIONS: [usize; 3] = [30, 50, 100];

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: usize = 30;

/// One page of a collection plus the metadata needed to render pagers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub total_items: usize,
    pub total_pages: usize,
    /// Index of the first item of the page in the full collection.
    pub start_index: usize,
    /// Exclusive end index, clipped to the collection length.
    pub end_index: usize,
    pub items: &'a [T],
}

impl<'a, 'b, T: Clone> Page<'a, &'b T> {
    /// Owned view of a page taken over a filtered list of references.
    pub fn cloned_view(&self) -> PageView<T> {
        PageView {
            total_items: self.total_items,
            total_pages: self.total_pages,
            start_index: self.start_index,
            end_index: self.end_index,
            items: self.items.iter().map(|item| (*item).clone()).collect(),
        }
    }
}

/// Owned counterpart of [`Page`], handed out by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView<T> {
    pub total_items: usize,
    pub total_pages: usize,
    pub start_index: usize,
    pub end_index: usize,
    pub items: Vec<T>,
}

/// Returns page `page` (1-based) of `items` with `page_size` rows.
///
/// Never fails: page 0 reads as page 1, a zero page size as 1, and pages
/// past the end come back empty.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> Page<'_, T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);

    let start_index = (page - 1).saturating_mul(page_size);
    let end_index = start_index.saturating_add(page_size).min(total_items);
    let slice = if start_index < total_items {
        &items[start_index..end_index]
    } else {
        &items[0..0]
    };

    Page {
        total_items,
        total_pages,
        start_index,
        end_index,
        items: slice,
    }
}

/// Current page and page size of one paginated view.
///
/// Always satisfies `1 <= page <= max(1, total_pages)` for the last total
/// it was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    page: usize,
    page_size: usize,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PageCursor {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self, total_items: usize) -> usize {
        total_items.div_ceil(self.page_size)
    }

    /// Moves to `page`, clamped into the range valid for `total_items`.
    pub fn set_page(&mut self, page: usize, total_items: usize) {
        let last = self.total_pages(total_items).max(1);
        self.page = page.clamp(1, last);
    }

    /// Changing the page size always returns to the first page.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    pub fn next(&mut self, total_items: usize) {
        self.set_page(self.page.saturating_add(1), total_items);
    }

    pub fn previous(&mut self, total_items: usize) {
        self.set_page(self.page.saturating_sub(1), total_items);
    }

    /// Re-clamps after the collection shrank underneath the cursor.
    pub fn clamp(&mut self, total_items: usize) {
        self.set_page(self.page, total_items);
    }

    pub fn apply<'a, T>(&self, items: &'a [T]) -> Page<'a, T> {
        paginate(items, self.page, self.page_size)
    }
}
