//! The query facade every logical client talks to.

use std::sync::Arc;

use tracing::{debug, error};

use crate::envelope::QueryResult;
use crate::error::StoreError;
use crate::lifecycle::LifecycleManager;
use crate::patients::queries::{INSERT_PATIENT, LIST_BY_ID, LIST_BY_NAME, SEARCH_BY_NAME};
use crate::patients::{NewPatient, PatientRecord, RegisteredPatient, like_pattern};
use crate::results::ResultSet;
use crate::sqlite::{PatientOrdering, StoreHandle, StoreOptions, StoreOptionsBuilder};
use crate::status::{InitStatus, StatusBroadcaster};
use crate::translation::{TranslationMode, translate_placeholders};
use crate::types::DbValue;

/// Entry point for patient storage.
///
/// Clones are independent logical clients (one per tab or view) that share
/// a single lifecycle manager, and therefore a single engine instance.
///
/// ```rust,no_run
/// use patient_store::prelude::*;
///
/// # async fn demo() -> Result<(), StoreError> {
/// let store = PatientStore::builder("clinic.db").build();
/// let id = store
///     .register_patient(&NewPatient::new("Ada", "Lovelace", 28, "female", "555-0100"))
///     .await?;
/// let found = store.search_patients_by_name("love").await?;
/// assert_eq!(found[0].id, id.id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct PatientStore {
    lifecycle: Arc<LifecycleManager>,
    status: StatusBroadcaster,
}

impl PatientStore {
    /// Nothing is opened until the first operation or
    /// [`PatientStore::ensure_initialized`].
    #[must_use]
    pub fn new(options: StoreOptions) -> Self {
        Self::from_lifecycle(LifecycleManager::shared(options))
    }

    #[must_use]
    pub fn from_lifecycle(lifecycle: Arc<LifecycleManager>) -> Self {
        let status = StatusBroadcaster::new(Arc::clone(&lifecycle));
        Self { lifecycle, status }
    }

    #[must_use]
    pub fn builder(db_path: impl Into<String>) -> StoreOptionsBuilder {
        StoreOptionsBuilder::new(db_path)
    }

    #[must_use]
    pub fn lifecycle(&self) -> &Arc<LifecycleManager> {
        &self.lifecycle
    }

    #[must_use]
    pub fn status(&self) -> &StatusBroadcaster {
        &self.status
    }

    /// Start initialization in the background and wait for the status to
    /// settle. UI collaborators call this once at startup.
    pub async fn initialize(&self) -> InitStatus {
        self.status.initialize().await
    }

    /// # Errors
    /// Returns `StoreError::InitializationError` if the engine cannot be
    /// opened or the schema cannot be provisioned.
    pub async fn ensure_initialized(&self) -> Result<StoreHandle, StoreError> {
        self.lifecycle.ensure_initialized().await
    }

    /// Insert a patient and return the identifier the engine assigned.
    ///
    /// # Errors
    /// Returns `StoreError::EngineError` on a constraint violation (blank
    /// required field, negative age) or `StoreError::InitializationError`.
    pub async fn register_patient(
        &self,
        patient: &NewPatient,
    ) -> Result<RegisteredPatient, StoreError> {
        let result = self.insert_patient(patient).await;
        if let Err(err) = &result {
            error!(error = %err, "error adding patient");
        }
        result
    }

    async fn insert_patient(&self, patient: &NewPatient) -> Result<RegisteredPatient, StoreError> {
        let handle = self.ensure_initialized().await?;
        let rs = handle.query_cached(INSERT_PATIENT, &patient.to_params()).await?;
        let id = rs
            .results
            .first()
            .and_then(|row| row.get("id"))
            .and_then(DbValue::as_int)
            .ok_or_else(|| {
                StoreError::ExecutionError("insert did not return a patient id".to_string())
            })?;
        debug!(id, "patient registered");
        Ok(RegisteredPatient { id })
    }

    /// Every stored patient, in the order fixed by `StoreOptions::list_order`.
    ///
    /// # Errors
    /// Returns `StoreError::EngineError` or `StoreError::InitializationError`.
    pub async fn list_all_patients(&self) -> Result<Vec<PatientRecord>, StoreError> {
        let sql = match self.lifecycle.options().list_order {
            PatientOrdering::Id => LIST_BY_ID,
            PatientOrdering::Name => LIST_BY_NAME,
        };
        let result = self.select_patients(sql, &[]).await;
        if let Err(err) = &result {
            error!(error = %err, "error fetching patients");
        }
        result
    }

    /// Patients whose first or last name contains `term`. Wildcard
    /// characters in `term` match literally; an empty term matches everyone.
    ///
    /// # Errors
    /// Returns `StoreError::EngineError` or `StoreError::InitializationError`.
    pub async fn search_patients_by_name(
        &self,
        term: &str,
    ) -> Result<Vec<PatientRecord>, StoreError> {
        let pattern = DbValue::Text(like_pattern(term));
        let result = self.select_patients(SEARCH_BY_NAME, &[pattern]).await;
        if let Err(err) = &result {
            error!(error = %err, "error searching patients");
        }
        result
    }

    async fn select_patients(
        &self,
        sql: &str,
        params: &[DbValue],
    ) -> Result<Vec<PatientRecord>, StoreError> {
        let handle = self.ensure_initialized().await?;
        let rs = handle.query_cached(sql, params).await?;
        rs.results.iter().map(PatientRecord::from_row).collect()
    }

    /// Run caller-supplied SQL with bound parameters. Never fails: every
    /// outcome, initialization failure included, comes back as a
    /// [`QueryResult`].
    pub async fn execute_query(&self, sql: &str, params: &[DbValue]) -> QueryResult {
        self.execute_query_with(sql, params, TranslationMode::StoreDefault)
            .await
    }

    /// [`PatientStore::execute_query`] with an explicit placeholder
    /// translation choice for this call.
    pub async fn execute_query_with(
        &self,
        sql: &str,
        params: &[DbValue],
        translation: TranslationMode,
    ) -> QueryResult {
        let result = self.run_ad_hoc(sql, params, translation).await;
        if let Err(err) = &result {
            error!(error = %err, "error executing query");
        }
        QueryResult::from(result)
    }

    async fn run_ad_hoc(
        &self,
        sql: &str,
        params: &[DbValue],
        translation: TranslationMode,
    ) -> Result<ResultSet, StoreError> {
        let handle = self.ensure_initialized().await?;
        let enabled = translation.resolve(self.lifecycle.options().translate_placeholders);
        let sql = translate_placeholders(sql, enabled);
        handle.query(sql.into_owned(), params).await
    }
}

impl StoreOptionsBuilder {
    /// Finish the options and wrap them in a [`PatientStore`].
    #[must_use]
    pub fn build(self) -> PatientStore {
        PatientStore::new(self.finish())
    }
}
