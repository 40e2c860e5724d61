use rusqlite::types::Value;
use tokio::sync::oneshot;

use crate::error::StoreError;
use crate::results::ResultSet;

pub(super) type Reply<T> = oneshot::Sender<Result<T, StoreError>>;

/// Requests accepted by the store worker, handled strictly in arrival order.
pub(super) enum Command {
    ExecuteBatch {
        query: String,
        respond_to: Reply<()>,
    },
    Query {
        query: String,
        params: Vec<Value>,
        /// Reuse the connection's statement cache.
        cached: bool,
        respond_to: Reply<ResultSet>,
    },
    Shutdown,
}
