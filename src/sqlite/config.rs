use std::str::FromStr;
use std::time::Duration;

use clap::ValueEnum;
use serde::Deserialize;

use crate::error::StoreError;

/// In-memory database path understood by SQLite.
pub const MEMORY_DB_PATH: &str = ":memory:";

/// What happens after the first initialization attempt fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitFailurePolicy {
    /// A later `ensure_initialized` call tries again from scratch.
    #[default]
    Retry,
    /// The first failure is cached and returned to every later caller.
    Fatal,
}

/// Row order of `list_all_patients`, fixed for the lifetime of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientOrdering {
    /// Insertion order (`ORDER BY id`).
    #[default]
    Id,
    /// Alphabetical (`ORDER BY last_name, first_name, id`).
    Name,
}

impl FromStr for InitFailurePolicy {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
            .map_err(|_| StoreError::ConfigError(format!("unknown failure policy: {s}")))
    }
}

impl FromStr for PatientOrdering {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
            .map_err(|_| StoreError::ConfigError(format!("unknown patient ordering: {s}")))
    }
}

/// Options for the embedded store.
///
/// Deserializable so a host application can embed it in its own config file;
/// every field except `db_path` has a default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// File path, or `:memory:` for a process-private database.
    pub db_path: String,
    /// Use WAL journaling (file databases only).
    pub wal: bool,
    /// How long the engine waits on a locked database file.
    pub busy_timeout_ms: u64,
    pub foreign_keys: bool,
    pub failure_policy: InitFailurePolicy,
    pub list_order: PatientOrdering,
    /// Rewrite `$N` placeholders to `?N` on the ad-hoc query path.
    pub translate_placeholders: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            db_path: MEMORY_DB_PATH.to_string(),
            wal: true,
            busy_timeout_ms: 5_000,
            foreign_keys: true,
            failure_policy: InitFailurePolicy::default(),
            list_order: PatientOrdering::default(),
            translate_placeholders: true,
        }
    }
}

impl StoreOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn builder(db_path: impl Into<String>) -> StoreOptionsBuilder {
        StoreOptionsBuilder::new(db_path)
    }

    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.db_path == MEMORY_DB_PATH || self.db_path.starts_with("file::memory:")
    }

    #[must_use]
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Reject options that can never open a database.
    ///
    /// # Errors
    /// Returns `StoreError::ConfigError` for an empty path.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.db_path.trim().is_empty() {
            return Err(StoreError::ConfigError(
                "db_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Connection-level settings applied on the worker thread right after
    /// the engine is opened.
    pub(crate) fn apply_pragmas(&self, conn: &rusqlite::Connection) -> Result<(), StoreError> {
        conn.busy_timeout(self.busy_timeout())?;
        let foreign_keys = if self.foreign_keys { "ON" } else { "OFF" };
        conn.execute_batch(&format!("PRAGMA foreign_keys = {foreign_keys};"))?;
        if self.wal && !self.is_memory() {
            // journal_mode reports the resulting mode as a row
            let mode: String =
                conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
            tracing::debug!(db_path = %self.db_path, %mode, "journal mode set");
        }
        Ok(())
    }
}

/// Fluent builder for [`StoreOptions`].
#[derive(Debug, Clone)]
pub struct StoreOptionsBuilder {
    opts: StoreOptions,
}

impl StoreOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: StoreOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn wal(mut self, wal: bool) -> Self {
        self.opts.wal = wal;
        self
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.opts.foreign_keys = enabled;
        self
    }

    #[must_use]
    pub fn failure_policy(mut self, policy: InitFailurePolicy) -> Self {
        self.opts.failure_policy = policy;
        self
    }

    #[must_use]
    pub fn list_order(mut self, order: PatientOrdering) -> Self {
        self.opts.list_order = order;
        self
    }

    #[must_use]
    pub fn translation(mut self, translate_placeholders: bool) -> Self {
        self.opts.translate_placeholders = translate_placeholders;
        self
    }

    #[must_use]
    pub fn finish(self) -> StoreOptions {
        self.opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let opts: StoreOptions =
            serde_json::from_str(r#"{"db_path":"clinic.db","list_order":"name"}"#).unwrap();
        assert_eq!(opts.db_path, "clinic.db");
        assert_eq!(opts.list_order, PatientOrdering::Name);
        assert_eq!(opts.failure_policy, InitFailurePolicy::Retry);
        assert!(opts.translate_placeholders);
        assert!(!opts.is_memory());
    }

    #[test]
    fn builder_overrides() {
        let opts = StoreOptions::builder(MEMORY_DB_PATH)
            .failure_policy(InitFailurePolicy::Fatal)
            .busy_timeout(Duration::from_secs(2))
            .translation(false)
            .finish();
        assert!(opts.is_memory());
        assert_eq!(opts.failure_policy, InitFailurePolicy::Fatal);
        assert_eq!(opts.busy_timeout_ms, 2_000);
        assert!(!opts.translate_placeholders);
    }

    #[test]
    fn policies_parse_case_insensitively() {
        assert_eq!("FATAL".parse::<InitFailurePolicy>().unwrap(), InitFailurePolicy::Fatal);
        assert_eq!("name".parse::<PatientOrdering>().unwrap(), PatientOrdering::Name);
        assert!("sometimes".parse::<InitFailurePolicy>().is_err());
    }

    #[test]
    fn empty_path_is_rejected() {
        assert!(matches!(
            StoreOptions::new("  ").validate(),
            Err(StoreError::ConfigError(_))
        ));
    }
}
