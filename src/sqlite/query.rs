use rusqlite::Statement;
use rusqlite::types::Value;

use crate::error::StoreError;
use crate::results::ResultSet;
use crate::types::DbValue;

use super::params::values_as_tosql;

fn extract_value(row: &rusqlite::Row<'_>, idx: usize) -> Result<DbValue, StoreError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => DbValue::Null,
        Value::Integer(i) => DbValue::Int(i),
        Value::Real(f) => DbValue::Float(f),
        Value::Text(s) => DbValue::Text(s),
        Value::Blob(b) => DbValue::Blob(b),
    })
}

/// Run a prepared statement and collect its output.
///
/// Statements that yield columns (including `INSERT … RETURNING`) produce
/// rows; anything else is executed and reports the affected-row count.
///
/// # Errors
/// Returns `StoreError::EngineError` if binding, stepping or reading a column fails.
pub fn build_result_set(stmt: &mut Statement<'_>, params: &[Value]) -> Result<ResultSet, StoreError> {
    let param_refs = values_as_tosql(params);

    if stmt.column_count() == 0 {
        let changed = stmt.execute(&param_refs[..])?;
        return Ok(ResultSet::affected(changed));
    }

    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(16);
    result_set.set_column_names(std::sync::Arc::new(column_names));

    let mut rows = stmt.query(&param_refs[..])?;
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            values.push(extract_value(row, i)?);
        }
        result_set.add_row_values(values);
    }

    Ok(result_set)
}
