//! Record extraction from a header pair and data rows.
//!
//! Segment layout tables use a two-row header: the upper row holds group
//! labels written once over the leftmost column they span, the lower row
//! holds per-column labels. Data rows with an empty leading cell are
//! wrapped text belonging to the record above.

use std::collections::BTreeSet;

use bdew_mig_models::{Cell, ColumnLabel, ExtractConfig, Record, Row, leading_cell};

use crate::MigError;

/// Pairs the upper and lower header rows into one label per column.
///
/// Group labels are carried forward to the right until the next non-empty
/// upper cell. Columns with an empty lower cell get no label (`None`) and
/// are dropped from every record. Extra cells of the longer row are
/// ignored.
#[must_use]
pub fn column_labels(upper: &[Cell], lower: &[Cell]) -> Vec<Option<ColumnLabel>> {
    upper
        .iter()
        .zip(lower)
        .scan(None::<&str>, |group, (upper, lower)| {
            if let Some(text) = upper.as_deref().filter(|text| !text.is_empty()) {
                *group = Some(text);
            }
            Some(
                lower
                    .as_deref()
                    .filter(|text| !text.is_empty())
                    .map(|label| ColumnLabel::new(*group, label)),
            )
        })
        .collect()
}

/// Extracts records from `grid`, whose first two rows are the header pair
/// and whose remaining rows are data and continuation rows.
///
/// # Errors
///
/// * [`MigError::TableTooShort`] if `grid` has fewer than two rows
/// * [`MigError::OrphanContinuationRow`] if the first data row is a
///   continuation row; `row` is its index within `grid`
pub fn extract_main_data(grid: &[Row], config: &ExtractConfig) -> Result<Vec<Record>, MigError> {
    let [upper, lower, data @ ..] = grid else {
        return Err(MigError::TableTooShort { rows: grid.len() });
    };

    let labels = column_labels(upper, lower);

    extract_records(&labels, data, &config.continuation_separator).map_err(|e| match e {
        MigError::OrphanContinuationRow { row } => MigError::OrphanContinuationRow { row: row + 2 },
        other => other,
    })
}

/// Folds data rows into records under the given column labels.
///
/// # Errors
///
/// Returns [`MigError::OrphanContinuationRow`] with the index within `rows`
/// if a continuation row appears before the first record.
pub fn extract_records(
    labels: &[Option<ColumnLabel>],
    rows: &[Row],
    separator: &str,
) -> Result<Vec<Record>, MigError> {
    let unlabeled = labels.iter().filter(|label| label.is_none()).count();
    if unlabeled > 0 {
        log::debug!("Dropping {unlabeled} column(s) without a header label");
    }

    let distinct: BTreeSet<&ColumnLabel> = labels.iter().flatten().collect();
    if distinct.len() < labels.len() - unlabeled {
        log::warn!("Header pair repeats a column label; later columns overwrite earlier ones");
    }

    let mut records: Vec<Record> = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        if leading_cell(row).is_some() {
            records.push(build_record(labels, row));
            continue;
        }

        let Some(target) = records.last_mut() else {
            return Err(MigError::OrphanContinuationRow { row: index });
        };
        merge_continuation(target, labels, row, separator);
    }

    Ok(records)
}

/// Builds a record holding every labeled column. Missing or absent cells
/// become empty strings so that every label is present.
fn build_record(labels: &[Option<ColumnLabel>], row: &[Cell]) -> Record {
    let mut record = Record::new();

    for (index, label) in labels.iter().enumerate() {
        let Some(label) = label else {
            continue;
        };
        let value = row.get(index).cloned().flatten().unwrap_or_default();
        record.insert(label.clone(), value);
    }

    record
}

/// Appends each non-empty cell of a continuation row to the matching field
/// of `target`, separated by `separator`. An empty field takes the value
/// without a separator.
pub fn merge_continuation(
    target: &mut Record,
    labels: &[Option<ColumnLabel>],
    row: &[Cell],
    separator: &str,
) {
    for (label, cell) in labels.iter().zip(row) {
        let (Some(label), Some(value)) = (label, cell.as_deref()) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }

        match target.get_mut(label) {
            Some(existing) if !existing.is_empty() => {
                existing.push_str(separator);
                existing.push_str(value);
            }
            Some(existing) => existing.push_str(value),
            None => target.insert(label.clone(), value.to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{grid, row};

    #[test]
    fn group_labels_are_sticky() {
        let labels = column_labels(&row(&["A", "-", "B"]), &row(&["x", "y", "z"]));
        assert_eq!(
            labels,
            vec![
                Some(ColumnLabel::new(Some("A"), "x")),
                Some(ColumnLabel::new(Some("A"), "y")),
                Some(ColumnLabel::new(Some("B"), "z")),
            ]
        );
    }

    #[test]
    fn empty_upper_cells_carry_group_and_leading_columns_have_none() {
        let labels = column_labels(&row(&["", "Standard", ""]), &row(&["Bez", "St", "MaxWdh"]));
        assert_eq!(
            labels,
            vec![
                Some(ColumnLabel::new(None, "Bez")),
                Some(ColumnLabel::new(Some("Standard"), "St")),
                Some(ColumnLabel::new(Some("Standard"), "MaxWdh")),
            ]
        );
    }

    #[test]
    fn empty_lower_cell_yields_no_label() {
        let labels = column_labels(&row(&["A", "B"]), &row(&["x", ""]));
        assert_eq!(labels, vec![Some(ColumnLabel::new(Some("A"), "x")), None]);
    }

    #[test]
    fn continuation_row_is_newline_joined() {
        let table = grid(&[&["-"], &["f"], &["line1"], &["-"]]);
        let mut records = extract_main_data(&table, &ExtractConfig::default()).unwrap();
        assert_eq!(records.len(), 1);

        let labels = [Some(ColumnLabel::new(None, "f"))];
        merge_continuation(&mut records[0], &labels, &row(&["line2"]), "\n");
        assert_eq!(records[0].field(None, "f"), Some("line1\nline2"));
    }

    #[test]
    fn folds_continuation_rows_into_previous_record() {
        let table = grid(&[
            &["-", "Standard", "-", "BDEW"],
            &["Bez", "St", "Name", "Bedingung"],
            &["UNH", "M", "Nachrichten-", "[1]"],
            &["", "-", "Kopfsegment", ""],
            &["-", "", "", "[2]"],
            &["BGM", "M", "Beginn", "-"],
        ]);

        let records = extract_main_data(&table, &ExtractConfig::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].field(None, "Bez"), Some("UNH"));
        assert_eq!(
            records[0].field(Some("Standard"), "Name"),
            Some("Nachrichten-\nKopfsegment")
        );
        assert_eq!(records[0].field(Some("BDEW"), "Bedingung"), Some("[1]\n[2]"));
        assert_eq!(records[1].field(Some("Standard"), "St"), Some("M"));
        assert_eq!(records[1].field(Some("BDEW"), "Bedingung"), Some(""));
    }

    #[test]
    fn merge_into_empty_field_has_no_leading_separator() {
        let table = grid(&[&["-", "-"], &["Bez", "Anm"], &["UNH", "-"], &["-", "Hinweis"]]);
        let records = extract_main_data(&table, &ExtractConfig::default()).unwrap();
        assert_eq!(records[0].field(None, "Anm"), Some("Hinweis"));
    }

    #[test]
    fn unlabeled_column_never_appears() {
        let table = grid(&[
            &["A", "-", "B"],
            &["x", "", "z"],
            &["1", "dropped", "3"],
            &["-", "also dropped", "4"],
            &["5", "-", "-"],
        ]);

        let records = extract_main_data(&table, &ExtractConfig::default()).unwrap();
        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record.len(), 2);
            assert!(record.iter().all(|(_, value)| !value.contains("dropped")));
        }
        assert_eq!(records[0].field(Some("B"), "z"), Some("3\n4"));
    }

    #[test]
    fn short_rows_still_carry_every_label() {
        let table = grid(&[&["A", "-", "-"], &["x", "y", "z"], &["1"]]);
        let records = extract_main_data(&table, &ExtractConfig::default()).unwrap();
        assert_eq!(records[0].len(), 3);
        assert_eq!(records[0].field(Some("A"), "z"), Some(""));
    }

    #[test]
    fn custom_separator() {
        let table = grid(&[
            &["-", "-"],
            &["Bez", "Name"],
            &["UNH", "Nachrichten-"],
            &["-", "Kopfsegment"],
        ]);
        let config = ExtractConfig {
            continuation_separator: " ".to_owned(),
            ..ExtractConfig::default()
        };

        let records = extract_main_data(&table, &config).unwrap();
        assert_eq!(records[0].field(None, "Name"), Some("Nachrichten- Kopfsegment"));
    }

    #[test]
    fn orphan_continuation_row_is_an_error() {
        let table = grid(&[&["-", "Standard"], &["Bez", "St"], &["", "M"], &["UNH", "M"]]);
        assert!(matches!(
            extract_main_data(&table, &ExtractConfig::default()),
            Err(MigError::OrphanContinuationRow { row: 2 })
        ));
    }

    #[test]
    fn grid_without_header_pair_is_too_short() {
        let table = grid(&[&["Bez"]]);
        assert!(matches!(
            extract_main_data(&table, &ExtractConfig::default()),
            Err(MigError::TableTooShort { rows: 1 })
        ));
    }
}
