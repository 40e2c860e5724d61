//! Lazy, single-winner initialization of the store.
//!
//! The first `ensure_initialized` call spawns the worker, provisions the
//! schema and caches the handle. Callers that arrive while that attempt is in
//! flight wait for it and receive its outcome instead of starting their own.
//! Every outcome is also published as an [`InitStatus`], so the status seen
//! by subscribers always follows the manager, whichever client triggered it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::error::StoreError;
use crate::schema::provision_schema;
use crate::sqlite::{InitFailurePolicy, StoreHandle, StoreOptions};
use crate::status::InitStatus;

type Outcome = Result<StoreHandle, Arc<StoreError>>;

enum Slot {
    Idle,
    InFlight(watch::Receiver<Option<Outcome>>),
    Ready(StoreHandle),
    /// Only reachable under `InitFailurePolicy::Fatal`.
    Failed(Arc<StoreError>),
}

enum Step {
    Done(Result<StoreHandle, StoreError>),
    Wait(watch::Receiver<Option<Outcome>>),
    Initialize(watch::Sender<Option<Outcome>>),
}

/// Owns the one-time creation of the [`StoreHandle`].
pub struct LifecycleManager {
    options: StoreOptions,
    slot: Mutex<Slot>,
    status: watch::Sender<InitStatus>,
    channels_created: AtomicUsize,
    attempts: AtomicUsize,
}

impl LifecycleManager {
    /// No I/O happens until the first [`LifecycleManager::ensure_initialized`].
    #[must_use]
    pub fn new(options: StoreOptions) -> Self {
        Self {
            options,
            slot: Mutex::new(Slot::Idle),
            status: watch::channel(InitStatus::Loading).0,
            channels_created: AtomicUsize::new(0),
            attempts: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn shared(options: StoreOptions) -> Arc<Self> {
        Arc::new(Self::new(options))
    }

    #[must_use]
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Return the cached handle, creating the worker and provisioning the
    /// schema on the first call.
    ///
    /// # Errors
    /// Returns `StoreError::InitializationError` carrying the underlying cause.
    /// Under `InitFailurePolicy::Retry` the next call starts a fresh attempt;
    /// under `InitFailurePolicy::Fatal` every later call gets the same error.
    pub async fn ensure_initialized(&self) -> Result<StoreHandle, StoreError> {
        loop {
            match self.next_step() {
                Step::Done(result) => return result,
                Step::Initialize(sender) => return self.run_initialization(sender).await,
                Step::Wait(mut receiver) => {
                    let outcome = match receiver.wait_for(Option::is_some).await {
                        Ok(value) => Option::clone(&value),
                        // initializer was cancelled; its guard reset the slot
                        Err(_) => None,
                    };
                    match outcome {
                        Some(Ok(handle)) => return Ok(handle),
                        Some(Err(cause)) => return Err(StoreError::InitializationError(cause)),
                        None => {}
                    }
                }
            }
        }
    }

    /// The cached handle, if initialization has already succeeded.
    #[must_use]
    pub fn handle(&self) -> Option<StoreHandle> {
        match &*self.lock_slot() {
            Slot::Ready(handle) => Some(handle.clone()),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.handle().is_some()
    }

    /// Subscribe to the published initialization status.
    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<InitStatus> {
        self.status.subscribe()
    }

    #[must_use]
    pub fn status(&self) -> InitStatus {
        InitStatus::clone(&self.status.borrow())
    }

    /// Number of worker channels this manager has spawned.
    #[must_use]
    pub fn channels_created(&self) -> usize {
        self.channels_created.load(Ordering::SeqCst)
    }

    /// Number of initialization attempts started, successful or not.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn next_step(&self) -> Step {
        let mut slot = self.lock_slot();
        match &*slot {
            Slot::Ready(handle) => return Step::Done(Ok(handle.clone())),
            Slot::Failed(cause) => {
                return Step::Done(Err(StoreError::InitializationError(Arc::clone(cause))));
            }
            Slot::InFlight(receiver) => return Step::Wait(receiver.clone()),
            Slot::Idle => {}
        }
        let (sender, receiver) = watch::channel(None);
        *slot = Slot::InFlight(receiver);
        Step::Initialize(sender)
    }

    async fn run_initialization(
        &self,
        sender: watch::Sender<Option<Outcome>>,
    ) -> Result<StoreHandle, StoreError> {
        let mut guard = InFlightGuard {
            manager: self,
            armed: true,
        };
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        info!(attempt, db_path = %self.options.db_path, "initializing patient store");

        let outcome: Outcome = self.initialize_once().await.map_err(into_cause);
        guard.armed = false;

        {
            let mut slot = self.lock_slot();
            *slot = match &outcome {
                Ok(handle) => Slot::Ready(handle.clone()),
                Err(cause) => match self.options.failure_policy {
                    InitFailurePolicy::Retry => Slot::Idle,
                    InitFailurePolicy::Fatal => Slot::Failed(Arc::clone(cause)),
                },
            };
        }

        match &outcome {
            Ok(handle) => info!(attempt, channel_id = handle.channel_id(), "patient store ready"),
            Err(cause) => match self.options.failure_policy {
                InitFailurePolicy::Retry => {
                    warn!(attempt, error = %cause, "patient store initialization failed; will retry on next call");
                }
                InitFailurePolicy::Fatal => {
                    error!(attempt, error = %cause, "patient store initialization failed");
                }
            },
        }

        self.publish_status(&outcome);
        // no receivers left is fine
        let _ = sender.send(Some(outcome.clone()));
        outcome.map_err(StoreError::InitializationError)
    }

    /// `Loading` settles on the first outcome. `Ready` never changes; `Failed`
    /// gives way to `Ready` only when a retry later succeeds.
    fn publish_status(&self, outcome: &Outcome) {
        let next = match outcome {
            Ok(_) => InitStatus::Ready,
            Err(cause) => {
                InitStatus::Failed(StoreError::InitializationError(Arc::clone(cause)).to_string())
            }
        };
        let retry = self.options.failure_policy == InitFailurePolicy::Retry;
        self.status.send_if_modified(|current| {
            let replace = match current {
                InitStatus::Loading => true,
                InitStatus::Failed(_) => retry && next.is_ready(),
                InitStatus::Ready => false,
            };
            if replace {
                *current = next;
            }
            replace
        });
    }

    async fn initialize_once(&self) -> Result<StoreHandle, StoreError> {
        let handle = StoreHandle::spawn(&self.options).await?;
        self.channels_created.fetch_add(1, Ordering::SeqCst);
        provision_schema(&handle).await?;
        Ok(handle)
    }
}

impl std::fmt::Debug for LifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("db_path", &self.options.db_path)
            .field("status", &self.status())
            .field("channels_created", &self.channels_created())
            .finish_non_exhaustive()
    }
}

fn into_cause(err: StoreError) -> Arc<StoreError> {
    match err {
        StoreError::InitializationError(cause) => cause,
        other => Arc::new(other),
    }
}

/// Returns the slot to `Idle` if the initializing future is dropped before
/// it records an outcome, so a waiter can take over.
struct InFlightGuard<'a> {
    manager: &'a LifecycleManager,
    armed: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut slot = self.manager.lock_slot();
            if matches!(*slot, Slot::InFlight(_)) {
                *slot = Slot::Idle;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure() -> Outcome {
        Err(Arc::new(StoreError::ConfigError("db_path must not be empty".into())))
    }

    #[tokio::test]
    async fn ready_status_is_final() -> Result<(), StoreError> {
        let manager = LifecycleManager::new(StoreOptions::in_memory());
        let handle = manager.ensure_initialized().await?;
        assert_eq!(manager.status(), InitStatus::Ready);

        manager.publish_status(&failure());
        assert_eq!(manager.status(), InitStatus::Ready);
        drop(handle);
        Ok(())
    }

    #[tokio::test]
    async fn failed_status_yields_to_successful_retry_only() -> Result<(), StoreError> {
        let fatal = LifecycleManager::new(
            StoreOptions::builder(crate::sqlite::MEMORY_DB_PATH)
                .failure_policy(InitFailurePolicy::Fatal)
                .finish(),
        );
        fatal.publish_status(&failure());
        let handle = LifecycleManager::new(StoreOptions::in_memory())
            .ensure_initialized()
            .await?;
        fatal.publish_status(&Ok(handle.clone()));
        assert!(fatal.status().is_failed());

        let retry = LifecycleManager::new(StoreOptions::in_memory());
        retry.publish_status(&failure());
        assert!(retry.status().error().is_some_and(|e| e.contains("db_path")));
        retry.publish_status(&Ok(handle));
        assert_eq!(retry.status(), InitStatus::Ready);
        Ok(())
    }
}
