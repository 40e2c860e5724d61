//! The isolated execution channel: one OS thread owns the engine connection
//! and serves requests from every logical client, one at a time, in arrival
//! order. Callers only ever hold a [`StoreHandle`].

use std::fmt;
use std::sync::Arc;

use crate::error::StoreError;
use crate::results::ResultSet;
use crate::types::DbValue;

use super::config::StoreOptions;
use super::params::Params;

mod channel;
mod dispatcher;
mod manager;

use manager::StoreWorker;

/// Shared handle to the single engine instance.
///
/// Cloning is cheap; every clone talks to the same worker. The worker shuts
/// down once the last clone is dropped, after finishing requests already
/// queued.
#[derive(Clone)]
pub struct StoreHandle {
    worker: Arc<StoreWorker>,
}

impl StoreHandle {
    /// Spawn a worker thread, open the engine on it and return its handle.
    ///
    /// # Errors
    /// Returns `StoreError::ConfigError` for unusable options,
    /// `StoreError::EngineError` if the engine cannot be opened or configured,
    /// and `StoreError::ConnectionError` if the thread cannot be started.
    pub(crate) async fn spawn(options: &StoreOptions) -> Result<Self, StoreError> {
        let worker = StoreWorker::spawn(options).await?;
        Ok(Self {
            worker: Arc::new(worker),
        })
    }

    /// Sequence number of the worker behind this handle, unique per process.
    #[must_use]
    pub fn channel_id(&self) -> u64 {
        self.worker.channel_id()
    }

    /// Whether both handles front the same engine instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &StoreHandle) -> bool {
        Arc::ptr_eq(&self.worker, &other.worker)
    }

    /// Run several parameterless statements inside one transaction.
    ///
    /// # Errors
    /// Returns `StoreError::EngineError` if any statement fails (the batch is
    /// rolled back) or `StoreError::ConnectionError` if the worker is gone.
    pub async fn execute_batch(&self, sql: impl Into<String>) -> Result<(), StoreError> {
        self.worker.execute_batch(sql.into()).await
    }

    /// Run one statement with positional parameters.
    ///
    /// # Errors
    /// Returns `StoreError::EngineError` with the engine's diagnostic if the
    /// statement fails, or `StoreError::ConnectionError` if the worker is gone.
    pub async fn query(
        &self,
        sql: impl Into<String>,
        params: &[DbValue],
    ) -> Result<ResultSet, StoreError> {
        self.worker
            .query(sql.into(), Params::convert(params).into_values(), false)
            .await
    }

    /// Like [`StoreHandle::query`] but reuses the worker's statement cache;
    /// meant for the fixed statements of the domain operations.
    pub(crate) async fn query_cached(
        &self,
        sql: &str,
        params: &[DbValue],
    ) -> Result<ResultSet, StoreError> {
        self.worker
            .query(sql.to_string(), Params::convert(params).into_values(), true)
            .await
    }
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle")
            .field("channel_id", &self.channel_id())
            .finish()
    }
}
