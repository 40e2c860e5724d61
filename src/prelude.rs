//! Convenient imports for common functionality.
//!
//! This module re-exports the types most callers need to open a store and
//! work with patients or ad-hoc queries.

pub use crate::envelope::QueryResult;
pub use crate::error::StoreError;
pub use crate::lifecycle::LifecycleManager;
pub use crate::patients::{NewPatient, PatientRecord, RegisteredPatient};
pub use crate::results::{ResultSet, StoreRow};
pub use crate::sqlite::{
    InitFailurePolicy, PatientOrdering, StoreHandle, StoreOptions, StoreOptionsBuilder,
};
pub use crate::status::{InitStatus, StatusBroadcaster};
pub use crate::store::PatientStore;
pub use crate::translation::{TranslationMode, translate_placeholders};
pub use crate::types::DbValue;
