use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::thread;

use rusqlite::types::Value;
use tokio::sync::oneshot;

use crate::error::StoreError;
use crate::results::ResultSet;
use crate::sqlite::config::StoreOptions;

use super::channel::{Command, Reply};
use super::dispatcher::{open_connection, run_store_worker};

/// Process-wide sequence for naming worker threads.
static NEXT_CHANNEL_ID: AtomicU64 = AtomicU64::new(1);

pub(super) struct StoreWorker {
    sender: Sender<Command>,
    channel_id: u64,
}

impl StoreWorker {
    /// Start the worker thread and wait until it has opened the engine.
    pub(super) async fn spawn(options: &StoreOptions) -> Result<Self, StoreError> {
        let channel_id = NEXT_CHANNEL_ID.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel::<Command>();
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), StoreError>>();
        let options = options.clone();

        thread::Builder::new()
            .name(format!("patient-store-worker-{channel_id}"))
            .spawn(move || match open_connection(&options) {
                Ok(conn) => {
                    let _ = ready_tx.send(Ok(()));
                    run_store_worker(conn, &receiver, channel_id);
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                }
            })
            .map_err(|err| {
                StoreError::ConnectionError(format!("failed to spawn store worker thread: {err}"))
            })?;

        ready_rx
            .await
            .map_err(|_| connection_error("store worker exited before opening the database"))??;

        Ok(Self { sender, channel_id })
    }

    pub(super) fn channel_id(&self) -> u64 {
        self.channel_id
    }

    fn send_command(&self, command: Command) -> Result<(), StoreError> {
        self.sender
            .send(command)
            .map_err(|_| connection_error("store worker closed"))
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> Command,
        drop_message: &'static str,
    ) -> Result<T, StoreError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(build(tx))?;
        rx.await.map_err(|_| connection_error(drop_message))?
    }

    pub(super) async fn execute_batch(&self, query: String) -> Result<(), StoreError> {
        self.request(
            |respond_to| Command::ExecuteBatch { query, respond_to },
            "store worker dropped while executing batch",
        )
        .await
    }

    pub(super) async fn query(
        &self,
        query: String,
        params: Vec<Value>,
        cached: bool,
    ) -> Result<ResultSet, StoreError> {
        self.request(
            |respond_to| Command::Query {
                query,
                params,
                cached,
                respond_to,
            },
            "store worker dropped while executing query",
        )
        .await
    }
}

impl Drop for StoreWorker {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
    }
}

fn connection_error(message: &str) -> StoreError {
    StoreError::ConnectionError(message.into())
}
