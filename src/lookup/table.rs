use crate::identifier::CanonicalIdentifier;
use crate::lookup::{LookupOutcome, Record, RecordSource};
use crate::secondary_validation::extract_digits;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;

/// Where the identifier lives in a table and which columns stay out of the
/// returned [Record]. Column numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    identifier_column: NonZeroUsize,
    ignore_columns: BTreeSet<NonZeroUsize>,
}

impl TableLayout {
    pub fn new(identifier_column: NonZeroUsize) -> Self {
        TableLayout {
            identifier_column,
            ignore_columns: BTreeSet::new(),
        }
    }

    pub fn ignore_columns(mut self, columns: impl IntoIterator<Item = NonZeroUsize>) -> Self {
        self.ignore_columns.extend(columns);
        self
    }

    pub fn identifier_column(&self) -> NonZeroUsize {
        self.identifier_column
    }

    pub fn ignored_columns(&self) -> impl Iterator<Item = NonZeroUsize> + '_ {
        self.ignore_columns.iter().copied()
    }

    fn is_ignored(&self, index: usize) -> bool {
        index + 1 == self.identifier_column.get()
            || self
                .ignore_columns
                .iter()
                .any(|column| column.get() == index + 1)
    }
}

impl Default for TableLayout {
    fn default() -> Self {
        TableLayout::new(NonZeroUsize::MIN)
    }
}

/// Searches `rows` (header row first) for the row whose identifier cell has
/// the same digits as `identifier`. Separators and spacing in the stored cell
/// don't matter. The first matching row wins.
pub fn find_record(
    rows: &[Vec<String>],
    layout: &TableLayout,
    identifier: &CanonicalIdentifier,
) -> LookupOutcome {
    let Some((headers, data)) = rows.split_first() else {
        return LookupOutcome::NotFound;
    };

    let column = layout.identifier_column.get();
    let column_index = column - 1;
    if column_index >= headers.len() {
        return LookupOutcome::LookupFailed(format!("column {column} is outside the table"));
    }

    let wanted = identifier.digits();
    let found_row = data.iter().find(|row| {
        row.get(column_index)
            .is_some_and(|cell| extract_digits(cell.trim()) == wanted)
    });

    let Some(row) = found_row else {
        return LookupOutcome::NotFound;
    };

    let record = headers
        .iter()
        .enumerate()
        .filter(|(index, _)| !layout.is_ignored(*index))
        .map(|(index, header)| {
            let value = row.get(index).map(|cell| cell.trim()).unwrap_or_default();
            (header.clone(), value.to_string())
        })
        .collect();
    LookupOutcome::Found(record)
}

/// A [RecordSource] over rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticTable {
    rows: Vec<Vec<String>>,
    layout: TableLayout,
}

impl StaticTable {
    pub fn new(rows: Vec<Vec<String>>, layout: TableLayout) -> Self {
        StaticTable { rows, layout }
    }

    pub fn from_rows<R, C>(rows: R, layout: TableLayout) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        StaticTable::new(rows, layout)
    }
}

impl RecordSource for StaticTable {
    fn lookup(&self, identifier: &CanonicalIdentifier) -> LookupOutcome {
        find_record(&self.rows, &self.layout, identifier)
    }
}
