//! Choosing which tables of the lazy sequence to print.

use clap::ValueEnum;

/// Which tables of the section to output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TableSelection {
    /// Every table.
    All,
    /// Only the first table; later pages are never read.
    First,
    /// Only the last table.
    Last,
    /// The first and the last table.
    FirstLast,
}

/// Drains as much of `tables` as `selection` needs.
///
/// # Errors
///
/// Returns the first error yielded by `tables` within the consumed part.
pub fn select_tables<T, E>(
    mut tables: impl Iterator<Item = Result<T, E>>,
    selection: TableSelection,
) -> Result<Vec<T>, E> {
    match selection {
        TableSelection::All => tables.collect(),
        TableSelection::First => tables.take(1).collect(),
        TableSelection::Last => Ok(last(tables)?.into_iter().collect()),
        TableSelection::FirstLast => {
            let Some(first) = tables.next().transpose()? else {
                return Ok(Vec::new());
            };
            let mut selected = vec![first];
            selected.extend(last(tables)?);
            Ok(selected)
        }
    }
}

fn last<T, E>(tables: impl Iterator<Item = Result<T, E>>) -> Result<Option<T>, E> {
    let mut last = None;
    for table in tables {
        last = Some(table?);
    }
    Ok(last)
}
