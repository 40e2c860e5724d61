use std::collections::HashMap;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::DbValue;

/// One row of a query result: a mapping from column name to value that keeps
/// the column order the engine reported.
#[derive(Debug, Clone)]
pub struct StoreRow {
    /// Column names, shared by every row of the same result set
    pub column_names: Arc<Vec<String>>,
    /// Values in column order
    pub values: Vec<DbValue>,
    column_index: Arc<HashMap<String, usize>>,
}

impl StoreRow {
    /// Build a standalone row. Rows produced by the engine share their
    /// column index through [`super::ResultSet::add_row_values`] instead.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<DbValue>) -> Self {
        let column_index = Arc::new(index_columns(&column_names));
        Self {
            column_names,
            values,
            column_index,
        }
    }

    pub(crate) fn with_index(
        column_names: Arc<Vec<String>>,
        column_index: Arc<HashMap<String, usize>>,
        values: Vec<DbValue>,
    ) -> Self {
        Self {
            column_names,
            values,
            column_index,
        }
    }

    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_index.get(column_name).copied()
    }

    /// Value of the named column, or `None` if the row has no such column.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&DbValue> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&DbValue> {
        self.values.get(index)
    }

    /// `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DbValue)> {
        self.column_names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PartialEq for StoreRow {
    fn eq(&self, other: &Self) -> bool {
        self.column_names == other.column_names && self.values == other.values
    }
}

/// Serializes as an object in column order. A repeated column name keeps its
/// first value, matching [`StoreRow::get`].
impl Serialize for StoreRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.column_index.len()))?;
        for (i, (column, value)) in self.iter().enumerate() {
            if self.get_column_index(column) == Some(i) {
                map.serialize_entry(column, value)?;
            }
        }
        map.end()
    }
}

/// First occurrence wins when a query returns duplicate column names.
pub(crate) fn index_columns(column_names: &[String]) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(column_names.len());
    for (i, name) in column_names.iter().enumerate() {
        index.entry(name.clone()).or_insert(i);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StoreRow {
        StoreRow::new(
            Arc::new(vec!["id".into(), "last_name".into(), "id".into()]),
            vec![DbValue::Int(1), DbValue::Text("Lovelace".into()), DbValue::Int(9)],
        )
    }

    #[test]
    fn lookup_by_name_uses_first_duplicate() {
        let row = sample();
        assert_eq!(row.get("id"), Some(&DbValue::Int(1)));
        assert_eq!(row.get("last_name").and_then(DbValue::as_text), Some("Lovelace"));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.get_by_index(2), Some(&DbValue::Int(9)));
    }

    #[test]
    fn serializes_in_column_order() {
        let row = StoreRow::new(
            Arc::new(vec!["z".into(), "a".into()]),
            vec![DbValue::Int(1), DbValue::Null],
        );
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"z":1,"a":null}"#);
    }

    #[test]
    fn serialization_keeps_first_duplicate() {
        let row = sample();
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"id":1,"last_name":"Lovelace"}"#
        );
    }
}
