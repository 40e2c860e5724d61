//! Patient table provisioning.
//!
//! Every statement is `IF NOT EXISTS`, so provisioning can run any number of
//! times, from any number of processes sharing the file, without error.
//!
//! The table is `STRICT`: a value that cannot be stored losslessly as the
//! declared column type is rejected, so `age` is always an integer and every
//! row decodes as a `PatientRecord`.

use tracing::info;

use crate::error::StoreError;
use crate::sqlite::StoreHandle;

pub const PATIENTS_TABLE: &str = "patients";
pub const NAME_INDEX: &str = "idx_patient_name";
pub const IMMUTABILITY_TRIGGER: &str = "patients_identity_immutable";

pub const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS patients (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name     TEXT NOT NULL CHECK (length(trim(first_name)) > 0),
    middle_name    TEXT,
    last_name      TEXT NOT NULL CHECK (length(trim(last_name)) > 0),
    age            INTEGER NOT NULL CHECK (age >= 0),
    gender         TEXT NOT NULL CHECK (length(trim(gender)) > 0),
    phone          TEXT NOT NULL CHECK (length(trim(phone)) > 0),
    address        TEXT,
    symptoms       TEXT,
    medical_record TEXT,
    relative_name  TEXT,
    relative_phone TEXT,
    created_at     TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
) STRICT;

CREATE INDEX IF NOT EXISTS idx_patient_name
    ON patients (last_name, first_name);

CREATE TRIGGER IF NOT EXISTS patients_identity_immutable
    BEFORE UPDATE OF id, created_at ON patients
BEGIN
    SELECT RAISE(ABORT, 'patient id and created_at are immutable');
END;
";

/// Create the patient table, its name index and the immutability trigger
/// if they are absent.
///
/// # Errors
/// Returns `StoreError::EngineError` if the engine rejects the batch.
pub async fn provision_schema(handle: &StoreHandle) -> Result<(), StoreError> {
    handle.execute_batch(SCHEMA_SQL).await?;
    info!(channel_id = handle.channel_id(), "patient schema provisioned");
    Ok(())
}
