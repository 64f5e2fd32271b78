#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Segment layout extraction for BDEW edi@energy message implementation
//! guides.
//!
//! The guides are published as PDFs whose "Segmentlayout" section is a
//! long run of tables, many of them spanning several pages. This crate
//! works on the per-page table grids produced by an external extractor
//! (anything implementing [`PageSource`]) and runs a forward-only
//! pipeline over them:
//!
//! 1. [`index`] reads the table of contents on page 0 and resolves the
//!    section's page range.
//! 2. [`stitch`] joins consecutive pages whose first rows match into
//!    [`LogicalTable`]s.
//! 3. [`segment`] splits each table into its header pair, data block and
//!    notes block.
//! 4. [`extract`] folds the data rows into [`Record`]s, merging wrapped
//!    continuation rows into the record above them.
//!
//! Tables are produced lazily: [`segment_layout_tables`] returns an
//! iterator that only touches the pages needed for the next table.

pub mod config;
pub mod extract;
pub mod index;
pub mod segment;
pub mod stitch;

use bdew_mig_models::{
    ExtractConfig, GridDocument, LogicalTable, PageGrid, Record, SectionRange, SegmentTable,
};

use crate::index::IndexLocator;
use crate::stitch::PageStitcher;

/// Errors raised while locating, stitching, or parsing segment layout
/// tables.
#[derive(Debug, thiserror::Error)]
pub enum MigError {
    /// Page 0 has no detected table to read the table of contents from.
    #[error("Index page has no table")]
    IndexPageMissing,

    /// No leader-dot rows were found on the index page.
    #[error("No table-of-contents block found on the index page")]
    IndexBlockNotFound,

    /// A row inside the table-of-contents block has no `title ... page`
    /// shape.
    #[error("Malformed table-of-contents entry: {row:?}")]
    IndexEntryMalformed {
        /// Text of the offending leading cell.
        row: String,
    },

    /// The table of contents has no entry with the requested title.
    #[error("Section '{title}' not found in table of contents")]
    SectionNotFound {
        /// The title that was searched for.
        title: String,
    },

    /// The section's page range extends past the end of the document.
    /// Any table already open at that page is yielded before this error.
    #[error("Page {page} is out of range (document has {page_count} pages)")]
    PageOutOfRange {
        /// Requested page index.
        page: usize,
        /// Number of pages in the document.
        page_count: usize,
    },

    /// A stitched table cannot hold a caption row plus a header pair.
    #[error("Table has only {rows} rows, need a caption row and two header rows")]
    TableTooShort {
        /// Number of rows in the table.
        rows: usize,
    },

    /// A continuation row appeared before any record it could extend.
    #[error("Continuation row {row} has no preceding record")]
    OrphanContinuationRow {
        /// Row index of the continuation row within the parsed grid.
        row: usize,
    },

    /// The leader-dot pattern failed to compile.
    #[error("Invalid regex pattern: {0}")]
    Regex(#[from] regex::Error),

    /// The extraction configuration could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-page table access provided by a document backend.
///
/// Implementations must be deterministic: asking for the same page twice
/// returns equivalent grids.
pub trait PageSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Returns the best-effort table grid of a page, or `None` if no table
    /// was detected on it.
    fn page_grid(&self, page_index: usize) -> Option<PageGrid>;
}

impl PageSource for GridDocument {
    fn page_count(&self) -> usize {
        self.len()
    }

    fn page_grid(&self, page_index: usize) -> Option<PageGrid> {
        self.page(page_index).cloned()
    }
}

/// Reads the table of contents on page 0 and resolves the page range of
/// the configured section.
///
/// # Errors
///
/// * [`MigError::IndexPageMissing`] if page 0 has no table
/// * [`MigError::IndexBlockNotFound`] / [`MigError::IndexEntryMalformed`]
///   if the table of contents cannot be parsed
/// * [`MigError::SectionNotFound`] if no entry carries the section title
pub fn locate_section<S: PageSource + ?Sized>(
    source: &S,
    config: &ExtractConfig,
) -> Result<SectionRange, MigError> {
    let index_grid = source.page_grid(0).ok_or(MigError::IndexPageMissing)?;
    let entries = IndexLocator::new(config)?.entries(&index_grid)?;

    log::debug!("Table of contents has {} entries", entries.len());

    index::resolve_section(&entries, &config.section_title)
}

/// Returns a lazy iterator over the stitched tables of the configured
/// section.
///
/// # Errors
///
/// Returns any error from [`locate_section`].
pub fn stitch_pages_with_config<'a, S: PageSource + ?Sized>(
    source: &'a S,
    config: &ExtractConfig,
) -> Result<PageStitcher<'a, S>, MigError> {
    let range = locate_section(source, config)?;
    let stop = range.stop_or(source.page_count());

    log::info!(
        "Section '{}' spans pages {}..{stop}",
        config.section_title,
        range.start
    );

    Ok(PageStitcher::new(source, range.start..stop, config.empty_pages))
}

/// [`stitch_pages_with_config`] with the default configuration.
///
/// # Errors
///
/// Returns any error from [`locate_section`].
pub fn stitch_pages<S: PageSource + ?Sized>(source: &S) -> Result<PageStitcher<'_, S>, MigError> {
    stitch_pages_with_config(source, &ExtractConfig::default())
}

/// Lazy sequence of parsed segment layout tables.
///
/// Each call to [`Iterator::next`] stitches just enough pages to complete
/// one table and parses it. The iterator fuses after the first error.
pub struct SegmentLayoutTables<'a, S: ?Sized> {
    stitcher: PageStitcher<'a, S>,
    config: ExtractConfig,
    failed: bool,
}

impl<S: PageSource + ?Sized> Iterator for SegmentLayoutTables<'_, S> {
    type Item = Result<SegmentTable, MigError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let result = self
            .stitcher
            .next()?
            .and_then(|table| parse_logical_table(&table, &self.config));

        if result.is_err() {
            self.failed = true;
        }

        Some(result)
    }
}

fn parse_logical_table(
    table: &LogicalTable,
    config: &ExtractConfig,
) -> Result<SegmentTable, MigError> {
    let parsed = segment::parse_segment_table(&table.rows, config)?;

    log::info!(
        "Pages {}..={}: {} records, {} note rows",
        table.first_page,
        table.last_page,
        parsed.records.len(),
        parsed.notes.len()
    );

    Ok(parsed)
}

/// Returns a lazy iterator over the parsed segment layout tables of
/// `source`, using `config` for every heuristic.
///
/// # Errors
///
/// Returns any error from [`locate_section`]. Errors in individual tables
/// surface as items of the iterator.
pub fn segment_layout_tables_with_config<S: PageSource + ?Sized>(
    source: &S,
    config: ExtractConfig,
) -> Result<SegmentLayoutTables<'_, S>, MigError> {
    let stitcher = stitch_pages_with_config(source, &config)?;

    Ok(SegmentLayoutTables {
        stitcher,
        config,
        failed: false,
    })
}

/// [`segment_layout_tables_with_config`] with the default configuration.
///
/// # Errors
///
/// Returns any error from [`locate_section`].
pub fn segment_layout_tables<S: PageSource + ?Sized>(
    source: &S,
) -> Result<SegmentLayoutTables<'_, S>, MigError> {
    segment_layout_tables_with_config(source, ExtractConfig::default())
}

/// Returns a lazy iterator yielding the record list of every segment
/// layout table in the document.
///
/// # Errors
///
/// Returns any error from [`locate_section`]. Errors in individual tables
/// surface as items of the iterator.
pub fn extract_segment_layout_tables<S: PageSource + ?Sized>(
    source: &S,
) -> Result<impl Iterator<Item = Result<Vec<Record>, MigError>> + '_, MigError> {
    Ok(segment_layout_tables(source)?.map(|table| table.map(|table| table.records)))
}
