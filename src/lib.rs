//! Embedded patient store.
//!
//! A single SQLite engine lives on a dedicated worker thread. Every logical
//! client holds a cloned [`PatientStore`] and reaches that engine through one
//! serialized request channel, created lazily on first use.

pub mod envelope;
pub mod error;
pub mod lifecycle;
pub mod patients;
pub mod prelude;
pub mod results;
pub mod schema;
pub mod sqlite;
pub mod status;
pub mod store;
pub mod translation;
pub mod types;

pub use envelope::QueryResult;
pub use error::StoreError;
pub use lifecycle::LifecycleManager;
pub use patients::{NewPatient, PatientRecord, RegisteredPatient};
pub use results::{ResultSet, StoreRow};
pub use sqlite::{InitFailurePolicy, PatientOrdering, StoreHandle, StoreOptions};
pub use status::{InitStatus, StatusBroadcaster};
pub use store::PatientStore;
pub use types::DbValue;
