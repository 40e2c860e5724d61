use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::results::StoreRow;
use crate::types::DbValue;

/// Attributes of a patient to register. Field validation (non-empty names,
/// phone shape) belongs to the caller; the engine still rejects blank
/// required fields and negative ages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewPatient {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub age: i64,
    pub gender: String,
    pub phone: String,
    pub address: Option<String>,
    pub symptoms: Option<String>,
    pub medical_record: Option<String>,
    pub relative_name: Option<String>,
    pub relative_phone: Option<String>,
}

impl NewPatient {
    /// Required fields only; optional ones default to `None`.
    #[must_use]
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        age: i64,
        gender: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            age,
            gender: gender.into(),
            phone: phone.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_middle_name(mut self, middle_name: impl Into<String>) -> Self {
        self.middle_name = Some(middle_name.into());
        self
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    #[must_use]
    pub fn with_symptoms(mut self, symptoms: impl Into<String>) -> Self {
        self.symptoms = Some(symptoms.into());
        self
    }

    #[must_use]
    pub fn with_medical_record(mut self, medical_record: impl Into<String>) -> Self {
        self.medical_record = Some(medical_record.into());
        self
    }

    #[must_use]
    pub fn with_relative(
        mut self,
        relative_name: impl Into<String>,
        relative_phone: impl Into<String>,
    ) -> Self {
        self.relative_name = Some(relative_name.into());
        self.relative_phone = Some(relative_phone.into());
        self
    }

    /// Bind values in `INSERT_PATIENT` column order.
    pub(crate) fn to_params(&self) -> Vec<DbValue> {
        vec![
            DbValue::from(self.first_name.as_str()),
            DbValue::from(self.middle_name.clone()),
            DbValue::from(self.last_name.as_str()),
            DbValue::Int(self.age),
            DbValue::from(self.gender.as_str()),
            DbValue::from(self.phone.as_str()),
            DbValue::from(self.address.clone()),
            DbValue::from(self.symptoms.clone()),
            DbValue::from(self.medical_record.clone()),
            DbValue::from(self.relative_name.clone()),
            DbValue::from(self.relative_phone.clone()),
        ]
    }
}

/// Identifier the engine assigned to a newly registered patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegisteredPatient {
    pub id: i64,
}

/// A stored patient row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: i64,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub age: i64,
    pub gender: String,
    pub phone: String,
    pub address: Option<String>,
    pub symptoms: Option<String>,
    pub medical_record: Option<String>,
    pub relative_name: Option<String>,
    pub relative_phone: Option<String>,
    pub created_at: NaiveDateTime,
}

impl PatientRecord {
    /// Decode a row selected with the full patient column list.
    ///
    /// # Errors
    /// Returns `StoreError::ExecutionError` naming the first column that is
    /// missing or holds an unexpected type.
    pub fn from_row(row: &StoreRow) -> Result<Self, StoreError> {
        Ok(Self {
            id: required_int(row, "id")?,
            first_name: required_text(row, "first_name")?,
            middle_name: optional_text(row, "middle_name")?,
            last_name: required_text(row, "last_name")?,
            age: required_int(row, "age")?,
            gender: required_text(row, "gender")?,
            phone: required_text(row, "phone")?,
            address: optional_text(row, "address")?,
            symptoms: optional_text(row, "symptoms")?,
            medical_record: optional_text(row, "medical_record")?,
            relative_name: optional_text(row, "relative_name")?,
            relative_phone: optional_text(row, "relative_phone")?,
            created_at: row
                .get("created_at")
                .and_then(DbValue::as_timestamp)
                .ok_or_else(|| column_error("created_at", "a timestamp"))?,
        })
    }

    /// `first [middle] last`
    #[must_use]
    pub fn full_name(&self) -> String {
        match self.middle_name.as_deref().filter(|m| !m.is_empty()) {
            Some(middle) => format!("{} {} {}", self.first_name, middle, self.last_name),
            None => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

fn column_error(column: &str, expected: &str) -> StoreError {
    StoreError::ExecutionError(format!("column `{column}` is missing or not {expected}"))
}

fn required_int(row: &StoreRow, column: &str) -> Result<i64, StoreError> {
    match row.get(column) {
        Some(DbValue::Int(value)) => Ok(*value),
        _ => Err(column_error(column, "an integer")),
    }
}

fn required_text(row: &StoreRow, column: &str) -> Result<String, StoreError> {
    row.get(column)
        .and_then(DbValue::as_text)
        .map(str::to_string)
        .ok_or_else(|| column_error(column, "text"))
}

fn optional_text(row: &StoreRow, column: &str) -> Result<Option<String>, StoreError> {
    match row.get(column) {
        None | Some(DbValue::Null) => Ok(None),
        Some(DbValue::Text(value)) => Ok(Some(value.clone())),
        Some(_) => Err(column_error(column, "text")),
    }
}
