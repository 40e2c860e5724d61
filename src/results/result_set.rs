use std::collections::HashMap;
use std::sync::Arc;

use crate::types::DbValue;

use super::row::{StoreRow, index_columns};

/// Rows returned by one statement, plus the affected-row count for
/// statements that change data.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the statement
    pub results: Vec<StoreRow>,
    /// Rows returned (queries) or changed (DML)
    pub rows_affected: usize,
    column_names: Option<Arc<Vec<String>>>,
    column_index: Option<Arc<HashMap<String, usize>>>,
}

impl ResultSet {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            results: Vec::with_capacity(capacity),
            ..ResultSet::default()
        }
    }

    /// Result of a statement that produced no columns.
    #[must_use]
    pub fn affected(rows_affected: usize) -> ResultSet {
        ResultSet {
            rows_affected,
            ..ResultSet::default()
        }
    }

    /// Set the column names shared by every row added afterwards.
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_index = Some(Arc::new(index_columns(&column_names)));
        self.column_names = Some(column_names);
    }

    #[must_use]
    pub fn column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Append a row of values in column order. Ignored until column names
    /// are set.
    pub fn add_row_values(&mut self, values: Vec<DbValue>) {
        if let (Some(names), Some(index)) = (&self.column_names, &self.column_index) {
            self.results
                .push(StoreRow::with_index(Arc::clone(names), Arc::clone(index), values));
            self.rows_affected += 1;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<StoreRow> {
        self.results
    }
}

impl IntoIterator for ResultSet {
    type Item = StoreRow;
    type IntoIter = std::vec::IntoIter<StoreRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}
