//! Best-effort persistence of forecast rows to the relational store.
//!
//! The store is written through the [`PredictionSink`] trait; the real
//! implementation opens a fresh MySQL connection per call, and a null
//! implementation stands in when the database is disabled. Failures never
//! propagate past [`PredictionSink::persist`].

mod models;
mod sink;

pub use models::PredictionRecord;
pub use sink::{MySqlSink, NullSink, PersistOutcome, PredictionSink, sink_from_config};
