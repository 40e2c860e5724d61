use std::sync::mpsc::Receiver;

use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::results::ResultSet;
use crate::sqlite::config::StoreOptions;
use crate::sqlite::query::build_result_set;

use super::channel::Command;

/// Open the engine and apply connection settings. Runs on the worker thread
/// so the connection never leaves it.
pub(super) fn open_connection(options: &StoreOptions) -> Result<rusqlite::Connection, StoreError> {
    options.validate()?;
    let conn = rusqlite::Connection::open(&options.db_path)?;
    options.apply_pragmas(&conn)?;
    register_functions(&conn)?;
    Ok(conn)
}

/// `casefold(text)`: Unicode lowercase, for case-insensitive matching beyond
/// the ASCII folding built into `LIKE`. NULL and non-text values pass through.
fn register_functions(conn: &rusqlite::Connection) -> Result<(), StoreError> {
    conn.create_scalar_function(
        "casefold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Value = ctx.get(0)?;
            Ok(match value {
                Value::Text(text) => Value::Text(text.to_lowercase()),
                other => other,
            })
        },
    )?;
    Ok(())
}

pub(super) fn run_store_worker(
    mut conn: rusqlite::Connection,
    receiver: &Receiver<Command>,
    channel_id: u64,
) {
    info!(channel_id, "store worker started");

    while let Ok(command) = receiver.recv() {
        match command {
            Command::Shutdown => break,
            Command::ExecuteBatch { query, respond_to } => {
                debug!(channel_id, "executing batch");
                let _ = respond_to.send(execute_batch(&mut conn, &query));
            }
            Command::Query {
                query,
                params,
                cached,
                respond_to,
            } => {
                debug!(channel_id, params = params.len(), cached, "executing query");
                let _ = respond_to.send(execute_query(&conn, &query, &params, cached));
            }
        }
    }

    info!(channel_id, "store worker stopped");
}

fn execute_batch(conn: &mut rusqlite::Connection, query: &str) -> Result<(), StoreError> {
    let tx = conn.transaction()?;
    tx.execute_batch(query)?;
    tx.commit()?;
    Ok(())
}

fn execute_query(
    conn: &rusqlite::Connection,
    query: &str,
    params: &[Value],
    cached: bool,
) -> Result<ResultSet, StoreError> {
    if cached {
        let mut stmt = conn.prepare_cached(query)?;
        build_result_set(&mut stmt, params)
    } else {
        let mut stmt = conn.prepare(query)?;
        build_result_set(&mut stmt, params)
    }
}
