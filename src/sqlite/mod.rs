// SQLite engine layer
//
// - config: store options and connection pragmas
// - params: conversion from `DbValue` to engine values
// - query: result extraction
// - worker: the single thread that owns the connection

pub mod config;
pub mod params;
pub mod query;
pub mod worker;

pub use config::{
    InitFailurePolicy, MEMORY_DB_PATH, PatientOrdering, StoreOptions, StoreOptionsBuilder,
};
pub use query::build_result_set;
pub use worker::StoreHandle;
