//! Bindings for the embedded SQL engines.
//!
//! Adapters translate engine values into [`Cell`](crate::Cell)s, forward
//! folds and finalization to the registry's accumulators and translate the
//! results and errors back. They contain no SQL-dialect glue.

pub mod datafusion;
pub mod sqlite;
