mod model;
pub(crate) mod queries;

pub use model::{NewPatient, PatientRecord, RegisteredPatient};
pub use queries::like_pattern;
