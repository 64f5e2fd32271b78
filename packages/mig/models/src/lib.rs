#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Data types for BDEW edi@energy message implementation guide extraction.
//!
//! Pages arrive as raw [`PageGrid`]s (rows of optional text cells) from an
//! external table extractor. The pipeline in `bdew_mig` turns them into
//! [`IndexEntry`] lists, stitched [`LogicalTable`]s, and finally
//! [`SegmentTable`]s made of [`Record`]s keyed by two-level
//! [`ColumnLabel`]s.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

/// A single extracted table cell. `None` means the extractor saw no cell.
pub type Cell = Option<String>;

/// One row of a page grid.
pub type Row = Vec<Cell>;

/// The best-effort table grid extracted from a single document page.
pub type PageGrid = Vec<Row>;

/// Returns `true` if the cell is absent or holds an empty string.
#[must_use]
pub fn is_blank(cell: &Cell) -> bool {
    cell.as_deref().is_none_or(str::is_empty)
}

/// Returns the text of the row's leading cell, or `None` if it is blank or
/// the row has no cells at all.
#[must_use]
pub fn leading_cell(row: &[Cell]) -> Option<&str> {
    row.first()
        .and_then(Option::as_deref)
        .filter(|text| !text.is_empty())
}

/// A `(title, page number)` pair parsed from a table-of-contents row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Section title, e.g. `"Segmentlayout"`.
    pub title: String,
    /// Page index the section starts on.
    pub page: usize,
}

impl IndexEntry {
    /// Creates a new index entry.
    #[must_use]
    pub fn new(title: impl Into<String>, page: usize) -> Self {
        Self {
            title: title.into(),
            page,
        }
    }
}

/// The page range `[start, stop)` covered by a document section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRange {
    /// First page of the section.
    pub start: usize,
    /// Page of the following table-of-contents entry, if there is one.
    /// `None` means the section runs to the end of the document.
    pub stop: Option<usize>,
}

impl SectionRange {
    /// Resolves the exclusive stop page against the document length.
    #[must_use]
    pub fn stop_or(&self, page_count: usize) -> usize {
        self.stop.unwrap_or(page_count)
    }
}

/// A two-level column header: the sticky group label from the upper header
/// row and the column's own label from the lower one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnLabel {
    /// Upper header label carried forward from the nearest non-empty cell
    /// to the left. `None` until the first group label appears.
    pub group: Option<String>,
    /// Lower header label.
    pub label: String,
}

impl ColumnLabel {
    /// Creates a new column label.
    #[must_use]
    pub fn new(group: Option<&str>, label: impl Into<String>) -> Self {
        Self {
            group: group.map(ToOwned::to_owned),
            label: label.into(),
        }
    }
}

impl fmt::Display for ColumnLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.group {
            Some(group) => write!(f, "{group} / {}", self.label),
            None => f.write_str(&self.label),
        }
    }
}

/// One logical data row of a segment layout table.
///
/// Fields keep the column order of the header. Serializes as a JSON object
/// keyed by the [`ColumnLabel`]'s display form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: IndexMap<ColumnLabel, String>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, replacing any previous value while keeping its position.
    pub fn insert(&mut self, label: ColumnLabel, value: String) {
        self.fields.insert(label, value);
    }

    /// Returns the value stored under `label`.
    #[must_use]
    pub fn get(&self, label: &ColumnLabel) -> Option<&str> {
        self.fields.get(label).map(String::as_str)
    }

    /// Looks a field up by its group and column label text.
    #[must_use]
    pub fn field(&self, group: Option<&str>, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key.group.as_deref() == group && key.label == label)
            .map(|(_, value)| value.as_str())
    }

    /// Returns a mutable handle to the value stored under `label`.
    pub fn get_mut(&mut self, label: &ColumnLabel) -> Option<&mut String> {
        self.fields.get_mut(label)
    }

    /// Iterates over the fields in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&ColumnLabel, &str)> {
        self.fields.iter().map(|(key, value)| (key, value.as_str()))
    }

    /// Iterates over the column labels in column order.
    pub fn labels(&self) -> impl Iterator<Item = &ColumnLabel> {
        self.fields.keys()
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.fields
                .iter()
                .map(|(key, value)| (key.to_string(), value)),
        )
    }
}

/// A table reconstructed from one or more consecutive pages whose first
/// rows are identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalTable {
    /// Page index the table starts on.
    pub first_page: usize,
    /// Last page index that contributed rows.
    pub last_page: usize,
    /// All rows of all contributing pages, in page order. Repeated header
    /// rows of continuation pages are kept verbatim.
    pub rows: PageGrid,
}

/// The structured result of parsing one [`LogicalTable`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SegmentTable {
    /// One record per logical data row, continuation rows folded in.
    pub records: Vec<Record>,
    /// Header rows found after the header pair and before the data
    /// boundary. They do not contribute labels.
    pub extra_header_rows: Vec<Row>,
    /// Trailing notes block, passed through unprocessed.
    pub notes: Vec<Row>,
}

/// What the page stitcher does with a page that has no detected table.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EmptyPagePolicy {
    /// Ignore the page; a table may continue across it.
    #[default]
    Skip,
    /// Close the currently open table.
    Break,
}

/// Tunable constants of the extraction heuristics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractConfig {
    /// Table-of-contents title of the section to extract.
    pub section_title: String,
    /// Minimum number of consecutive dots that mark a table-of-contents row.
    pub min_leader_dots: usize,
    /// Row index where the search for the data boundary starts.
    pub data_scan_start_row: usize,
    /// Number of leading characters inspected when deciding whether a
    /// leading cell is numeric.
    pub numeric_prefix_len: usize,
    /// Separator placed between a field and text merged in from a
    /// continuation row.
    pub continuation_separator: String,
    /// Handling of pages without a detected table.
    pub empty_pages: EmptyPagePolicy,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            section_title: "Segmentlayout".to_owned(),
            min_leader_dots: 1,
            data_scan_start_row: 4,
            numeric_prefix_len: 4,
            continuation_separator: "\n".to_owned(),
            empty_pages: EmptyPagePolicy::Skip,
        }
    }
}

/// An in-memory document: one optional grid per page, in page order.
///
/// Deserializes from a JSON array whose elements are either `null` (no
/// table on that page) or an array of rows of nullable strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridDocument {
    pages: Vec<Option<PageGrid>>,
}

impl GridDocument {
    /// Creates a document from per-page grids.
    #[must_use]
    pub const fn new(pages: Vec<Option<PageGrid>>) -> Self {
        Self { pages }
    }

    /// Number of pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether the document has no pages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Returns the grid of a page, if the page exists and has a table.
    #[must_use]
    pub fn page(&self, index: usize) -> Option<&PageGrid> {
        self.pages.get(index).and_then(Option::as_ref)
    }
}
