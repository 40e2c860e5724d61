use rusqlite::types::Value;

use crate::types::DbValue;

/// Convert one [`DbValue`] into the engine's owned value type.
#[must_use]
pub fn to_sqlite_value(value: &DbValue) -> Value {
    match value {
        DbValue::Null => Value::Null,
        DbValue::Int(i) => Value::Integer(*i),
        DbValue::Float(f) => Value::Real(*f),
        DbValue::Text(s) => Value::Text(s.clone()),
        DbValue::Bool(b) => Value::Integer(i64::from(*b)),
        DbValue::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        DbValue::Json(json) => Value::Text(json.to_string()),
        DbValue::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

/// Owned parameter list, ready to cross the channel to the worker thread.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(pub Vec<Value>);

impl Params {
    #[must_use]
    pub fn convert(params: &[DbValue]) -> Self {
        Params(params.iter().map(to_sqlite_value).collect())
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.0
    }
}

pub(crate) fn values_as_tosql(values: &[Value]) -> Vec<&dyn rusqlite::ToSql> {
    values.iter().map(|v| v as &dyn rusqlite::ToSql).collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;
    use serde_json::json;

    use super::*;

    #[test]
    fn booleans_bind_as_integers() {
        assert_eq!(to_sqlite_value(&DbValue::Bool(true)), Value::Integer(1));
        assert_eq!(to_sqlite_value(&DbValue::Bool(false)), Value::Integer(0));
    }

    #[test]
    fn structured_values_bind_as_text() {
        let ts = NaiveDateTime::parse_from_str("2024-03-01 09:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(
            to_sqlite_value(&DbValue::Timestamp(ts)),
            Value::Text("2024-03-01 09:30:00".into())
        );
        assert_eq!(
            to_sqlite_value(&DbValue::Json(json!({"allergies": ["penicillin"]}))),
            Value::Text(r#"{"allergies":["penicillin"]}"#.into())
        );
    }
}
