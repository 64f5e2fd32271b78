//! Table-of-contents parsing.
//!
//! The guide's first page lists its sections as `Title ........ 12` rows.
//! [`IndexLocator`] finds that block in the page grid and turns it into
//! [`IndexEntry`] values; [`resolve_section`] maps a section title to the
//! page range it covers.

use bdew_mig_models::{Cell, ExtractConfig, IndexEntry, PageGrid, SectionRange};
use regex::Regex;

use crate::MigError;

/// Finds and parses the table-of-contents block of an index page.
#[derive(Debug, Clone)]
pub struct IndexLocator {
    leader: Regex,
    entry: Regex,
}

impl IndexLocator {
    /// Builds a locator whose leader-dot run is at least
    /// `config.min_leader_dots` dots long.
    ///
    /// # Errors
    ///
    /// Returns [`MigError::Regex`] if the pattern fails to compile.
    pub fn new(config: &ExtractConfig) -> Result<Self, MigError> {
        let dots = config.min_leader_dots.max(1);

        Ok(Self {
            leader: Regex::new(&format!(r"\.{{{dots},}}"))?,
            entry: Regex::new(&format!(r"^(.+?) ?\.{{{dots},}} ?(\d+)"))?,
        })
    }

    /// Whether the row's first cell contains a leader-dot run.
    #[must_use]
    pub fn is_index_row(&self, row: &[Cell]) -> bool {
        row.first()
            .and_then(Option::as_deref)
            .is_some_and(|text| self.leader.is_match(text))
    }

    /// Parses the contiguous block of leader-dot rows that starts at the
    /// first such row of `grid`.
    ///
    /// # Errors
    ///
    /// * [`MigError::IndexBlockNotFound`] if no row has a leader-dot run
    /// * [`MigError::IndexEntryMalformed`] if a block row does not end in a
    ///   page number
    pub fn entries(&self, grid: &PageGrid) -> Result<Vec<IndexEntry>, MigError> {
        let start = grid
            .iter()
            .position(|row| self.is_index_row(row))
            .ok_or(MigError::IndexBlockNotFound)?;

        let stop = grid[start + 1..]
            .iter()
            .position(|row| !self.is_index_row(row))
            .map_or(grid.len(), |offset| start + 1 + offset);

        log::debug!("Table of contents occupies rows {start}..{stop}");

        grid[start..stop]
            .iter()
            .map(|row| self.parse_entry(row))
            .collect()
    }

    fn parse_entry(&self, row: &[Cell]) -> Result<IndexEntry, MigError> {
        let text = row.first().and_then(Option::as_deref).unwrap_or_default();
        let malformed = || MigError::IndexEntryMalformed {
            row: text.to_owned(),
        };

        let caps = self.entry.captures(text).ok_or_else(malformed)?;
        let page = caps[2].parse::<usize>().map_err(|_| malformed())?;

        Ok(IndexEntry::new(&caps[1], page))
    }
}

/// Resolves the page range of the entry titled exactly `title`.
///
/// The range stops at the page of the following entry. When `title` is the
/// last entry the stop page is left open and callers read to the end of the
/// document.
///
/// # Errors
///
/// Returns [`MigError::SectionNotFound`] if no entry has that title.
pub fn resolve_section(entries: &[IndexEntry], title: &str) -> Result<SectionRange, MigError> {
    let position = entries
        .iter()
        .position(|entry| entry.title == title)
        .ok_or_else(|| MigError::SectionNotFound {
            title: title.to_owned(),
        })?;

    let stop = entries.get(position + 1).map(|next| next.page);
    if stop.is_none() {
        log::warn!("'{title}' is the last table-of-contents entry, reading to end of document");
    }

    Ok(SectionRange {
        start: entries[position].page,
        stop,
    })
}
