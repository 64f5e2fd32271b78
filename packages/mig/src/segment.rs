//! Structural split of a stitched segment layout table.
//!
//! Row 0 is the table caption. The header block starts at row 1; its
//! first two rows form the header pair. The data block begins at the
//! first row (searched from `data_scan_start_row`) whose leading cell is
//! blank or numeric, and ends at the first row whose cells other than the
//! leading one are all blank. Everything from there on is the notes block.
//!
//! A stitched table repeats the caption row at the top of every
//! continuation page, followed by that page's copy of the header block.
//! Those copies are dropped before the data and notes blocks are split.

use bdew_mig_models::{Cell, ExtractConfig, Row, SegmentTable, is_blank, leading_cell};

use crate::MigError;
use crate::extract::{column_labels, extract_records};

/// Caption row plus header pair.
const MIN_TABLE_ROWS: usize = 3;

/// Whether the first `prefix_len` characters of `text` parse as an integer.
#[must_use]
pub fn has_numeric_prefix(text: &str, prefix_len: usize) -> bool {
    let end = text
        .char_indices()
        .nth(prefix_len)
        .map_or(text.len(), |(index, _)| index);

    text[..end].trim().parse::<i64>().is_ok()
}

/// Whether `row` marks the start of the data block: its leading cell is
/// blank, or starts with a number.
#[must_use]
pub fn starts_data_block(row: &[Cell], prefix_len: usize) -> bool {
    leading_cell(row).is_none_or(|text| has_numeric_prefix(text, prefix_len))
}

/// Index of the first data row, or `table.len()` if there is none.
///
/// The search never starts before row 3 so the header pair stays intact.
#[must_use]
pub fn data_boundary(table: &[Row], config: &ExtractConfig) -> usize {
    let start = config.data_scan_start_row.max(MIN_TABLE_ROWS);

    (start..table.len())
        .find(|&index| starts_data_block(&table[index], config.numeric_prefix_len))
        .unwrap_or(table.len())
}

/// Index of the first row at or after `from` whose non-leading cells are
/// all blank.
#[must_use]
pub fn notes_start(table: &[Row], from: usize) -> Option<usize> {
    (from..table.len()).find(|&index| table[index].iter().skip(1).all(is_blank))
}

/// Row indices at which a page of a stitched table begins: 0, plus every
/// row after the first header pair that repeats the caption row.
#[must_use]
pub fn page_starts(table: &[Row]) -> Vec<usize> {
    let Some(caption) = table.first() else {
        return Vec::new();
    };

    std::iter::once(0)
        .chain((MIN_TABLE_ROWS..table.len()).filter(|&index| &table[index] == caption))
        .collect()
}

/// Indices of the rows after `boundary` that carry data or notes, skipping
/// the caption and header block each continuation page repeats.
fn body_rows(
    table: &[Row],
    boundary: usize,
    starts: &[usize],
    config: &ExtractConfig,
) -> Vec<usize> {
    let ends = starts.iter().skip(1).copied().chain(std::iter::once(table.len()));
    let mut rows = Vec::with_capacity(table.len().saturating_sub(boundary));

    for (&start, end) in starts.iter().zip(ends) {
        let first = if start == 0 {
            boundary
        } else {
            let skipped = data_boundary(&table[start..end], config);
            log::debug!("Dropping {skipped} repeated header row(s) at row {start}");
            start + skipped
        };
        rows.extend(first..end);
    }

    rows
}

/// Splits a stitched table into header, data and notes blocks and extracts
/// the records of the data block.
///
/// # Errors
///
/// * [`MigError::TableTooShort`] if the table has no room for a caption
///   row and a header pair
/// * [`MigError::OrphanContinuationRow`] if the first data row is a
///   continuation row; `row` is its index within `table`
pub fn parse_segment_table(
    table: &[Row],
    config: &ExtractConfig,
) -> Result<SegmentTable, MigError> {
    if table.len() < MIN_TABLE_ROWS {
        return Err(MigError::TableTooShort { rows: table.len() });
    }

    let starts = page_starts(table);
    let first_page_end = starts.get(1).copied().unwrap_or(table.len());
    let boundary = data_boundary(&table[..first_page_end], config);

    let upper = &table[1];
    let lower = &table[2];
    let extra_header_rows = table[MIN_TABLE_ROWS..boundary].to_vec();

    if !extra_header_rows.is_empty() {
        log::debug!(
            "{} header row(s) beyond the header pair are not used for labels",
            extra_header_rows.len()
        );
    }

    let body_indices = body_rows(table, boundary, &starts, config);
    let body: Vec<Row> = body_indices.iter().map(|&index| table[index].clone()).collect();
    let notes_row = notes_start(&body, 0);
    let data_end = notes_row.unwrap_or(body.len());

    let labels = column_labels(upper, lower);
    let records =
        extract_records(&labels, &body[..data_end], &config.continuation_separator).map_err(
            |e| match e {
                MigError::OrphanContinuationRow { row } => MigError::OrphanContinuationRow {
                    row: body_indices[row],
                },
                other => other,
            },
        )?;

    log::debug!(
        "{} page(s), {data_end} data row(s), {} note row(s)",
        starts.len(),
        body.len() - data_end
    );

    Ok(SegmentTable {
        records,
        extra_header_rows,
        notes: body[data_end..].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use bdew_mig_models::ColumnLabel;

    use super::*;
    use crate::test_utils::grid;

    fn header() -> Vec<Row> {
        grid(&[
            &["SG2 NAD Name und Adresse", "-", "-", "-"],
            &["-", "Standard", "-", "BDEW"],
            &["Bez", "St", "Name", "St"],
            &["", "", "", ""],
        ])
    }

    #[test]
    fn numeric_prefix() {
        assert!(has_numeric_prefix("0010", 4));
        assert!(has_numeric_prefix("00200 Zähler", 4));
        assert!(has_numeric_prefix("12", 4));
        assert!(has_numeric_prefix(" 42 Zähler", 4));
        assert!(!has_numeric_prefix("UNH", 4));
        assert!(!has_numeric_prefix("Zähler", 4));
        assert!(!has_numeric_prefix("", 4));
    }

    #[test]
    fn boundary_is_first_blank_or_numeric_leading_cell() {
        let mut table = header();
        table.extend(grid(&[&["Segment", "M", "x", "M"], &["0010", "M", "y", "M"]]));
        assert_eq!(data_boundary(&table, &ExtractConfig::default()), 5);

        let mut table = header();
        table.extend(grid(&[&["-", "M", "x", "M"]]));
        assert_eq!(data_boundary(&table, &ExtractConfig::default()), 4);
    }

    #[test]
    fn boundary_defaults_to_table_end() {
        let mut table = header();
        table.push(grid(&[&["Segment", "M", "x", "M"]]).remove(0));
        assert_eq!(data_boundary(&table, &ExtractConfig::default()), 5);
    }

    #[test]
    fn boundary_scan_never_enters_header_pair() {
        let config = ExtractConfig {
            data_scan_start_row: 0,
            ..ExtractConfig::default()
        };
        let mut table = header();
        table.extend(grid(&[&["0010", "M", "x", "M"]]));
        assert_eq!(data_boundary(&table, &config), 3);
    }

    #[test]
    fn parses_records_and_extra_header_rows() {
        let mut table = header();
        table.extend(grid(&[
            &["Kopf", "-", "-", "-"],
            &["0010", "M", "Nachricht", "M"],
            &["-", "-", "fortgesetzt", "-"],
            &["0020", "C", "Datum", "R"],
        ]));

        let parsed = parse_segment_table(&table, &ExtractConfig::default()).unwrap();

        assert_eq!(parsed.extra_header_rows.len(), 2);
        assert!(parsed.notes.is_empty());
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(
            parsed.records[0].get(&ColumnLabel::new(Some("Standard"), "Name")),
            Some("Nachricht\nfortgesetzt")
        );
        assert_eq!(parsed.records[1].field(Some("BDEW"), "St"), Some("R"));
    }

    #[test]
    fn splits_off_notes_block() {
        let mut table = header();
        table.extend(grid(&[
            &["0010", "M", "Nachricht", "M"],
            &["0020", "C", "Datum", "R"],
            &["Bemerkung:", "-", "", "-"],
            &["Nur für MSCONS", "Text", "-", "-"],
        ]));

        let parsed = parse_segment_table(&table, &ExtractConfig::default()).unwrap();

        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.notes.len(), 2);
        assert_eq!(parsed.notes[0][0].as_deref(), Some("Bemerkung:"));
    }

    #[test]
    fn unlabeled_column_is_dropped() {
        let table = grid(&[
            &["UNT", "-", "-"],
            &["-", "Standard", "-"],
            &["Bez", "", "St"],
            &["", "", ""],
            &["0010", "noise", "M"],
        ]);

        let parsed = parse_segment_table(&table, &ExtractConfig::default()).unwrap();
        let labels: Vec<String> = parsed.records[0].labels().map(ToString::to_string).collect();
        assert_eq!(labels, vec!["Bez", "Standard / St"]);
    }

    #[test]
    fn orphan_first_data_row() {
        let mut table = header();
        table.extend(grid(&[&["-", "M", "x", "M"], &["0010", "M", "y", "M"]]));

        assert!(matches!(
            parse_segment_table(&table, &ExtractConfig::default()),
            Err(MigError::OrphanContinuationRow { row: 4 })
        ));
    }

    #[test]
    fn header_only_table_has_no_records() {
        let parsed = parse_segment_table(&header(), &ExtractConfig::default()).unwrap();
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.extra_header_rows.len(), 1);
    }

    #[test]
    fn finds_page_starts_by_repeated_caption() {
        let mut table = header();
        table.extend(grid(&[&["0010", "M", "x", "M"]]));
        table.extend(header());
        table.extend(grid(&[&["0020", "M", "y", "M"]]));

        assert_eq!(page_starts(&table), vec![0, 5]);
        assert!(page_starts(&[]).is_empty());

        let same = grid(&[&["UNH", "-"], &["UNH", "-"], &["Bez", "St"], &["UNH", "-"]]);
        assert_eq!(page_starts(&same), vec![0, 3]);
    }

    #[test]
    fn drops_header_block_repeated_on_continuation_page() {
        let mut table = header();
        table.extend(grid(&[&["0010", "M", "Nachricht", "M"]]));
        table.extend(header());
        table.extend(grid(&[
            &["-", "-", "fortgesetzt", "-"],
            &["0020", "C", "Datum", "R"],
            &["Bemerkung:", "-", "-", "-"],
        ]));

        let parsed = parse_segment_table(&table, &ExtractConfig::default()).unwrap();

        assert_eq!(parsed.extra_header_rows.len(), 1);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(
            parsed.records[0].field(Some("Standard"), "Name"),
            Some("Nachricht\nfortgesetzt")
        );
        assert_eq!(parsed.records[1].field(None, "Bez"), Some("0020"));
        assert_eq!(parsed.notes.len(), 1);
        assert_eq!(parsed.notes[0][0].as_deref(), Some("Bemerkung:"));
    }

    #[test]
    fn first_page_without_data_rows() {
        let mut table = header();
        table.extend(header());
        table.extend(grid(&[&["0010", "M", "x", "M"]]));

        let parsed = parse_segment_table(&table, &ExtractConfig::default()).unwrap();

        assert_eq!(parsed.extra_header_rows.len(), 1);
        assert_eq!(parsed.records.len(), 1);
        assert!(parsed.notes.is_empty());
    }

    #[test]
    fn orphan_row_on_continuation_page_reports_stitched_index() {
        let mut table = header();
        table.extend(header());
        table.extend(grid(&[&["-", "M", "x", "M"]]));

        assert!(matches!(
            parse_segment_table(&table, &ExtractConfig::default()),
            Err(MigError::OrphanContinuationRow { row: 8 })
        ));
    }

    #[test]
    fn too_short_table() {
        let table = grid(&[&["UNH"], &["-"]]);
        assert!(matches!(
            parse_segment_table(&table, &ExtractConfig::default()),
            Err(MigError::TableTooShort { rows: 2 })
        ));
    }
}
