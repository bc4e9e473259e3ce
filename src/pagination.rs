//! Client-side pagination for the listing tables.

use crate::preferences::PaginationDefaults;
use serde::Serialize;

/// Page state over a list of `total_items` rows. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginator {
    page: usize,
    rows_per_page: usize,
    rows_per_page_options: Vec<usize>,
    total_items: usize,
    #[serde(skip)]
    initial_page: usize,
    #[serde(skip)]
    initial_rows_per_page: usize,
}

impl Paginator {
    pub fn new(total_items: usize, defaults: &PaginationDefaults) -> Self {
        Self::with_initial(total_items, 1, defaults.rows_per_page, defaults.rows_per_page_options.clone())
    }

    pub fn with_initial(total_items: usize, page: usize, rows_per_page: usize, options: Vec<usize>) -> Self {
        let page = page.max(1);
        let rows_per_page = rows_per_page.max(1);
        Self {
            page,
            rows_per_page,
            rows_per_page_options: options,
            total_items,
            initial_page: page,
            initial_rows_per_page: rows_per_page,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    pub fn rows_per_page_options(&self) -> &[usize] {
        &self.rows_per_page_options
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.rows_per_page)
    }

    /// Index of the first row on the current page.
    pub fn start_index(&self) -> usize {
        (self.page - 1) * self.rows_per_page
    }

    /// One past the last row on the current page (not clamped to the data).
    pub fn end_index(&self) -> usize {
        self.start_index() + self.rows_per_page
    }

    pub fn has_next_page(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_previous_page(&self) -> bool {
        self.page > 1
    }

    /// Rows of `items` on the current page.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.start_index().min(items.len());
        let end = self.end_index().min(items.len());
        &items[start..end]
    }

    /// Out-of-range pages are ignored.
    pub fn go_to_page(&mut self, page: usize) {
        if page >= 1 && page <= self.total_pages() {
            self.page = page;
        }
    }

    pub fn next(&mut self) {
        if self.has_next_page() {
            self.page += 1;
        }
    }

    pub fn previous(&mut self) {
        if self.has_previous_page() {
            self.page -= 1;
        }
    }

    pub fn first(&mut self) {
        self.page = 1;
    }

    pub fn last(&mut self) {
        self.page = self.total_pages().max(1);
    }

    /// Changing the page size always goes back to the first page.
    pub fn set_rows_per_page(&mut self, rows_per_page: usize) {
        if rows_per_page == 0 {
            return;
        }
        self.rows_per_page = rows_per_page;
        self.page = 1;
    }

    /// New data arrived; stay on the current page unless it no longer exists.
    pub fn set_total_items(&mut self, total_items: usize) {
        self.total_items = total_items;
        self.page = self.page.min(self.total_pages().max(1));
    }

    pub fn reset(&mut self) {
        self.page = self.initial_page;
        self.rows_per_page = self.initial_rows_per_page;
    }
}
