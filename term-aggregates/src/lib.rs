//! # Term Aggregates - Streaming Statistics for Embedded SQL Engines
//!
//! A library of one-pass statistical aggregate functions meant to be
//! registered as user-defined aggregates in SQLite or Apache DataFusion. Each
//! aggregate consumes a column incrementally, keeps bounded state and produces
//! one scalar when the group is finalized.
//!
//! ## Quick Start
//!
//! ```rust
//! use term_aggregates::prelude::*;
//!
//! let mut var = term_aggregates::registry::create("var", &[]).unwrap();
//! for value in 1..=6 {
//!     var.fold(&[Cell::from(value as i64)]).unwrap();
//! }
//! assert_eq!(var.finalize(), AggregateValue::Float(3.5));
//! ```
//!
//! Registering everything on a SQLite connection:
//!
//! ```rust
//! use rusqlite::Connection;
//! use term_aggregates::host::sqlite::register_all;
//!
//! let conn = Connection::open_in_memory().unwrap();
//! register_all(&conn).unwrap();
//! let flag: bool = conn
//!     .query_row("SELECT hasnan(x) FROM (SELECT 'NaN' AS x)", [], |row| row.get(0))
//!     .unwrap();
//! assert!(flag);
//! ```
//!
//! ## Input Handling
//!
//! Host values arrive as [`Cell`]s. Numbers and numeric text are accepted,
//! infinities included. NaN, non-numeric text and nulls are skipped, except by
//! `hasnan` and `hasinf` which look for them. An aggregate that accepted no
//! value finalizes to [`AggregateValue::NoData`] (SQL `NULL`), never to `0`.
//!
//! ## Aggregates
//!
//! - **Mean**: `amean`, `abs_mean`, `geometric_mean`, `wamean(w, x)`, `gmean(x[, p])`
//! - **Dispersion**: `var`, `varp`, `stdev`, `stdevp`, `sem`, `ci`,
//!   `variance(x[, modifier])`, `sdev(x[, modifier])`, `datarange`, `rms`
//! - **Shape**: `skew`, `skewp`, `kurt`, `kurtp`
//! - **Order statistics**: `median`, `mode`
//! - **Utility**: `arbitrary`, `hasnan`, `hasinf`, `prod`, `pearson(x, y)`,
//!   `frecency(date[, points][, 'now:<date>'])`
//!
//! ## Architecture
//!
//! - **`cell`**: input cells and their classification
//! - **`accumulators`**: the streaming algorithms, one module per family
//! - **`registry`**: static name/arity table with factories
//! - **`host`**: SQLite and DataFusion bindings
//! - **`config`**, **`logging`**, **`error`**: ambient configuration and diagnostics

pub mod accumulators;
pub mod cell;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod prelude;
pub mod registry;
pub mod traits;
pub mod value;

pub use cell::{Cell, Classified};
pub use error::{AggregateError, AggregateResult};
pub use registry::{list_aggregates, lookup, AggregateEntry};
pub use traits::{Accumulator, Configure};
pub use value::{AggregateValue, OutputKind};
