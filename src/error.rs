use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The engine could not be opened or the schema could not be provisioned.
    /// The cause is shared so every caller waiting on the same attempt sees it.
    #[error("Store initialization failed: {0}")]
    InitializationError(#[source] Arc<StoreError>),

    /// A single statement failed inside the engine (constraint violation,
    /// malformed SQL, type mismatch).
    #[error(transparent)]
    EngineError(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}

impl StoreError {
    /// Wrap `cause` as an initialization failure.
    #[must_use]
    pub fn initialization(cause: StoreError) -> Self {
        match cause {
            // never nest
            StoreError::InitializationError(inner) => StoreError::InitializationError(inner),
            other => StoreError::InitializationError(Arc::new(other)),
        }
    }

    #[must_use]
    pub fn is_initialization_error(&self) -> bool {
        matches!(self, StoreError::InitializationError(_))
    }

    #[must_use]
    pub fn is_engine_error(&self) -> bool {
        matches!(self, StoreError::EngineError(_))
    }

    /// The engine's diagnostic text when this is (or wraps) an engine failure.
    #[must_use]
    pub fn engine_message(&self) -> Option<String> {
        match self {
            StoreError::EngineError(err) => Some(err.to_string()),
            StoreError::InitializationError(inner) => inner.engine_message(),
            _ => None,
        }
    }

    /// Whether the engine rejected the statement because of a constraint
    /// (`NOT NULL`, `CHECK`, `UNIQUE`, trigger abort).
    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            StoreError::EngineError(rusqlite::Error::SqliteFailure(err, _)) => {
                err.code == rusqlite::ErrorCode::ConstraintViolation
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialization_wrapping_does_not_nest() {
        let first = StoreError::initialization(StoreError::ConfigError("empty path".into()));
        let again = StoreError::initialization(first);
        match again {
            StoreError::InitializationError(inner) => {
                assert!(matches!(*inner, StoreError::ConfigError(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn display_carries_cause() {
        let err = StoreError::initialization(StoreError::ConnectionError("worker gone".into()));
        assert_eq!(
            err.to_string(),
            "Store initialization failed: Connection error: worker gone"
        );
    }
}
