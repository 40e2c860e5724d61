//! Uniform result envelope for ad-hoc queries.

use serde::Serialize;

use crate::error::StoreError;
use crate::results::{ResultSet, StoreRow};

/// Message used when a failure carries no text of its own.
pub const GENERIC_QUERY_ERROR: &str = "Error executing query";

/// Outcome of [`crate::PatientStore::execute_query`].
///
/// `success == true` implies `error == None`; `success == false` implies an
/// empty `data` and a non-empty `error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub success: bool,
    pub data: Vec<StoreRow>,
    pub error: Option<String>,
}

impl QueryResult {
    #[must_use]
    pub fn ok(data: Vec<StoreRow>) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            GENERIC_QUERY_ERROR.to_string()
        } else {
            message
        };
        Self {
            success: false,
            data: Vec::new(),
            error: Some(message),
        }
    }

    /// Rows of a successful query. Statements that return no rows
    /// (`INSERT`, `UPDATE`, DDL) report an empty list.
    #[must_use]
    pub fn rows(&self) -> &[StoreRow] {
        &self.data
    }
}

impl From<Result<ResultSet, StoreError>> for QueryResult {
    fn from(result: Result<ResultSet, StoreError>) -> Self {
        match result {
            Ok(set) => QueryResult::ok(set.into_rows()),
            Err(err) => QueryResult::failed(err.engine_message().unwrap_or_else(|| err.to_string())),
        }
    }
}
