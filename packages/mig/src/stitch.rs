//! Cross-page table stitching.
//!
//! A table that continues onto the next page repeats its first row there,
//! so consecutive pages with identical first rows belong to the same
//! [`LogicalTable`]. Continuation pages are appended verbatim, repeated
//! rows included.

use std::ops::Range;

use bdew_mig_models::{EmptyPagePolicy, LogicalTable};

use crate::{MigError, PageSource};

/// Lazy iterator that reads pages in order and yields one
/// [`LogicalTable`] per run of continuing pages.
///
/// Only the pages needed to finish the next table are read. Fuses after
/// the first error. A table still open when a page turns out to be past
/// the end of the document is yielded before the error.
pub struct PageStitcher<'a, S: ?Sized> {
    source: &'a S,
    pages: Range<usize>,
    empty_pages: EmptyPagePolicy,
    open: Option<LogicalTable>,
    pending: Option<MigError>,
    done: bool,
}

impl<'a, S: PageSource + ?Sized> PageStitcher<'a, S> {
    /// Creates a stitcher over the page indices in `pages`.
    pub const fn new(source: &'a S, pages: Range<usize>, empty_pages: EmptyPagePolicy) -> Self {
        Self {
            source,
            pages,
            empty_pages,
            open: None,
            pending: None,
            done: false,
        }
    }
}

impl<S: PageSource + ?Sized> Iterator for PageStitcher<'_, S> {
    type Item = Result<LogicalTable, MigError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(error) = self.pending.take() {
            return Some(Err(error));
        }
        if self.done {
            return None;
        }

        let page_count = self.source.page_count();

        for page in self.pages.by_ref() {
            if page >= page_count {
                self.done = true;
                let error = MigError::PageOutOfRange { page, page_count };
                return match self.open.take() {
                    Some(table) => {
                        self.pending = Some(error);
                        Some(Ok(table))
                    }
                    None => Some(Err(error)),
                };
            }

            let Some(grid) = self.source.page_grid(page).filter(|grid| !grid.is_empty()) else {
                match self.empty_pages {
                    EmptyPagePolicy::Skip => {
                        log::warn!("Page {page} has no table, skipping");
                    }
                    EmptyPagePolicy::Break => {
                        log::debug!("Page {page} has no table, closing open table");
                        if let Some(table) = self.open.take() {
                            return Some(Ok(table));
                        }
                    }
                }
                continue;
            };

            let continues = self
                .open
                .as_ref()
                .is_some_and(|table| table.rows.first() == grid.first());

            if continues {
                if let Some(table) = self.open.as_mut() {
                    log::debug!(
                        "Page {page} continues the table from page {}",
                        table.first_page
                    );
                    table.last_page = page;
                    table.rows.extend(grid);
                }
                continue;
            }

            log::debug!("Page {page} starts a new table");

            let finished = self.open.replace(LogicalTable {
                first_page: page,
                last_page: page,
                rows: grid,
            });

            if let Some(table) = finished {
                return Some(Ok(table));
            }
        }

        self.done = true;
        self.open.take().map(Ok)
    }
}
