use std::fmt;
use std::fmt::Display;
use std::num::NonZeroUsize;

use crate::entry::Entry;

/// Fixed-size windows over an ordered sequence of rows.
///
/// The current page index is kept inside `0..page_count()` by every
/// operation, so [`PaginatedView::current_page_rows`] never goes out of range.
#[derive(Debug, Clone)]
pub struct PaginatedView<T = Entry> {
    rows: Vec<T>,
    page_size: NonZeroUsize,
    current_page: usize,
}

impl<T> PaginatedView<T> {
    pub fn new(rows: Vec<T>, page_size: NonZeroUsize) -> Self {
        PaginatedView {
            rows,
            page_size,
            current_page: 0,
        }
    }

    pub fn page_size(&self) -> NonZeroUsize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_count(&self) -> usize {
        self.rows.len()
    }

    /// Never less than one, an empty sequence still has one empty page.
    #[inline]
    pub fn page_count(&self) -> usize {
        self.rows.len().div_ceil(self.page_size.get()).max(1)
    }

    #[inline]
    fn last_page(&self) -> usize {
        self.page_count() - 1
    }

    #[inline]
    fn clamp_current(&mut self) {
        self.current_page = self.current_page.min(self.last_page());
    }

    pub fn current_page_rows(&self) -> &[T] {
        let size = self.page_size.get();
        let start = (self.current_page * size).min(self.rows.len());
        let end = (start + size).min(self.rows.len());
        &self.rows[start..end]
    }

    /// Current page rows with their position in the full sequence, counting from one.
    pub fn numbered_rows(&self) -> impl Iterator<Item = (usize, &T)> {
        let first = self.current_page * self.page_size.get() + 1;
        self.current_page_rows()
            .iter()
            .enumerate()
            .map(move |(offset, row)| (first + offset, row))
    }

    pub fn has_next_page(&self) -> bool {
        self.current_page < self.last_page()
    }

    pub fn has_previous_page(&self) -> bool {
        self.current_page > 0
    }

    pub fn next_page(&mut self) {
        if self.has_next_page() {
            self.current_page += 1;
        }
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.saturating_sub(1);
    }

    pub fn go_to_page(&mut self, index: i64) {
        let last = self.last_page();
        self.current_page = usize::try_from(index.max(0)).map_or(last, |index| index.min(last));
    }

    pub fn set_page_size(&mut self, page_size: NonZeroUsize) {
        self.page_size = page_size;
        self.clamp_current();
    }

    /// Replaces the underlying rows, e.g. after re-reading the ledger.
    pub fn refresh(&mut self, rows: Vec<T>) {
        self.rows = rows;
        self.clamp_current();
    }
}

// Free-text cells must not break the one-row-per-line layout.
fn cell(text: &str) -> String {
    text.replace(['\t', '\r', '\n'], " ")
}

impl Display for PaginatedView<Entry> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "S.No\tDate & Time\tName\tAmount\tReason\tTag\tFlow Type")?;

        for (serial, entry) in self.numbered_rows() {
            writeln!(
                f,
                "{}\t{}\t{}\t\u{20b9} {}\t{}\t{}\t{}",
                serial,
                entry.date_time.format("%d %B, %Y %I:%M:%S %p"),
                cell(&entry.name),
                entry.amount,
                cell(&entry.reason),
                cell(&entry.tag),
                entry.flow_type
            )?;
        }

        write!(
            f,
            "Page {} of {} ({} entries)",
            self.current_page + 1,
            self.page_count(),
            self.total_count()
        )
    }
}
