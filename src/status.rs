//! Process-wide initialization status that UI collaborators observe.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::watch;

use crate::lifecycle::LifecycleManager;

/// `Loading` settles on `Ready` or `Failed` once. `Ready` is final, and so
/// is `Failed` under `InitFailurePolicy::Fatal`; under the default retry
/// policy a later successful attempt moves `Failed` to `Ready`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum InitStatus {
    Loading,
    Ready,
    Failed(String),
}

impl InitStatus {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, InitStatus::Loading)
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, InitStatus::Ready)
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, InitStatus::Failed(_))
    }

    /// The failure reason, if initialization failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            InitStatus::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Read-only view of the lifecycle manager's initialization status, plus the
/// "on mount" trigger that starts the first attempt.
///
/// Clones share state; subscribers all observe the same transition, whether
/// the attempt was started here or by any other client of the manager.
#[derive(Clone)]
pub struct StatusBroadcaster {
    lifecycle: Arc<LifecycleManager>,
    started: Arc<AtomicBool>,
}

impl StatusBroadcaster {
    #[must_use]
    pub fn new(lifecycle: Arc<LifecycleManager>) -> Self {
        Self {
            lifecycle,
            started: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<InitStatus> {
        self.lifecycle.subscribe_status()
    }

    #[must_use]
    pub fn current(&self) -> InitStatus {
        self.lifecycle.status()
    }

    /// Launch the initialization attempt on the tokio runtime. Only the first
    /// call per broadcaster does anything; returns whether this call did.
    ///
    /// The attempt runs as its own task so dropping a caller that awaits
    /// [`StatusBroadcaster::initialize`] never leaves the status stuck in
    /// `Loading`. The lifecycle manager logs and publishes the outcome.
    pub fn start(&self) -> bool {
        if self.started.swap(true, Ordering::AcqRel) {
            return false;
        }
        let lifecycle = Arc::clone(&self.lifecycle);
        tokio::spawn(async move {
            let _ = lifecycle.ensure_initialized().await;
        });
        true
    }

    /// Start the attempt if needed and wait until the status settles.
    pub async fn initialize(&self) -> InitStatus {
        self.start();
        self.settled().await
    }

    /// Wait for a settled status without starting anything.
    pub async fn settled(&self) -> InitStatus {
        let mut receiver = self.subscribe();
        match receiver.wait_for(|status| !status.is_loading()).await {
            Ok(status) => InitStatus::clone(&status),
            Err(_) => self.current(),
        }
    }
}

impl std::fmt::Debug for StatusBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusBroadcaster")
            .field("status", &self.current())
            .finish_non_exhaustive()
    }
}
