//! SQLite binding through `rusqlite`'s user-defined aggregates.
//!
//! Every registry entry is registered once per accepted argument count. The
//! accumulator is built from the first row, whose trailing arguments are the
//! static parameters, and is consumed by `finalize`.

use std::os::raw::c_int;

use rusqlite::functions::{Aggregate, Context, FunctionFlags};
use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use rusqlite::Connection;
use tracing::{info, instrument};

use crate::cell::Cell;
use crate::config::RegistrationConfig;
use crate::error::{AggregateError, AggregateResult};
use crate::logging::{truncate_field, LogConfig};
use crate::registry::{self, AggregateEntry};
use crate::traits::Accumulator;
use crate::value::AggregateValue;

/// Maps a SQLite value onto a cell.
///
/// Text and blobs that are not valid UTF-8 become `Null`.
pub fn cell_from_value(value: ValueRef<'_>) -> Cell<'_> {
    match value {
        ValueRef::Null => Cell::Null,
        ValueRef::Integer(i) => Cell::Number(i as f64),
        ValueRef::Real(r) => Cell::Number(r),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            std::str::from_utf8(bytes).map_or(Cell::Null, Cell::Text)
        }
    }
}

impl ToSql for AggregateValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            AggregateValue::Float(v) => Value::Real(*v),
            AggregateValue::Boolean(b) => Value::Integer(i64::from(*b)),
            AggregateValue::NoData => Value::Null,
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

/// One registry entry bound as a SQLite aggregate.
#[derive(Debug, Clone)]
pub struct SqliteAggregate {
    entry: &'static AggregateEntry,
    log: LogConfig,
}

impl SqliteAggregate {
    pub fn new(entry: &'static AggregateEntry, log: LogConfig) -> Self {
        Self { entry, log }
    }

    fn host_error(&self, err: AggregateError) -> rusqlite::Error {
        crate::log_host_error!(
            self.log,
            aggregate = self.entry.name(),
            error = %truncate_field(&err.to_string(), self.log.max_field_length),
            "Aggregate failed, aborting group"
        );
        rusqlite::Error::UserFunctionError(Box::new(err))
    }
}

fn row<'c>(ctx: &'c Context<'_>) -> Vec<Cell<'c>> {
    (0..ctx.len()).map(|i| cell_from_value(ctx.get_raw(i))).collect()
}

impl Aggregate<Box<dyn Accumulator>, AggregateValue> for SqliteAggregate {
    fn init(&self, ctx: &mut Context<'_>) -> rusqlite::Result<Box<dyn Accumulator>> {
        let cells = row(ctx);
        let (_, params) = self
            .entry
            .split_args(&cells)
            .map_err(|e| self.host_error(e))?;
        self.entry.create(params).map_err(|e| self.host_error(e))
    }

    fn step(&self, ctx: &mut Context<'_>, acc: &mut Box<dyn Accumulator>) -> rusqlite::Result<()> {
        let cells = row(ctx);
        let (data, _) = self
            .entry
            .split_args(&cells)
            .map_err(|e| self.host_error(e))?;
        acc.fold(data).map_err(|e| self.host_error(e))
    }

    fn finalize(
        &self,
        _ctx: &mut Context<'_>,
        acc: Option<Box<dyn Accumulator>>,
    ) -> rusqlite::Result<AggregateValue> {
        match acc {
            Some(mut acc) => Ok(acc.finalize()),
            // No row reached the group.
            None => {
                let mut acc = self.entry.create(&[]).map_err(|e| self.host_error(e))?;
                Ok(acc.finalize())
            }
        }
    }
}

/// Function flags for one entry.
///
/// Time-dependent aggregates are never declared deterministic.
pub fn function_flags(entry: &AggregateEntry, config: &RegistrationConfig) -> FunctionFlags {
    let mut flags = FunctionFlags::SQLITE_UTF8;
    if config.deterministic && entry.is_deterministic() {
        flags |= FunctionFlags::SQLITE_DETERMINISTIC;
    }
    flags
}

/// Registers the selected aggregates on a connection.
///
/// Returns the number of aggregates registered (not counting the per-arity
/// duplicates).
///
/// # Examples
///
/// ```rust
/// use rusqlite::Connection;
/// use term_aggregates::config::RegistrationConfig;
/// use term_aggregates::host::sqlite::register_aggregates;
///
/// let conn = Connection::open_in_memory().unwrap();
/// register_aggregates(&conn, &RegistrationConfig::default()).unwrap();
///
/// let median: f64 = conn
///     .query_row(
///         "SELECT median(x) FROM (SELECT 1 AS x UNION ALL SELECT 5 UNION ALL SELECT 2)",
///         [],
///         |row| row.get(0),
///     )
///     .unwrap();
/// assert_eq!(median, 2.0);
/// ```
#[instrument(skip(conn, config))]
pub fn register_aggregates(conn: &Connection, config: &RegistrationConfig) -> AggregateResult<usize> {
    config.validate()?;

    let mut registered = 0;
    for entry in registry::list_aggregates()
        .iter()
        .filter(|entry| config.selects(entry.name()))
    {
        let flags = function_flags(entry, config);
        for n_arg in entry.arities() {
            conn.create_aggregate_function(
                entry.name(),
                n_arg as c_int,
                flags,
                SqliteAggregate::new(entry, config.log.clone()),
            )?;
            crate::log_registration!(
                config.log,
                aggregate = entry.name(),
                n_arg,
                "Registered SQLite aggregate"
            );
        }
        registered += 1;
    }

    info!(registered, "Registered aggregates with SQLite");
    Ok(registered)
}

/// Registers every bundled aggregate with the default configuration.
pub fn register_all(conn: &Connection) -> AggregateResult<usize> {
    register_aggregates(conn, &RegistrationConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (g TEXT, x, w);
             INSERT INTO t VALUES ('a', 1, 2), ('a', 2, 2), ('a', 'x', 1),
                                  ('b', 10, 1), ('b', NULL, 1), ('c', NULL, NULL);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_value_mapping() {
        assert_eq!(cell_from_value(ValueRef::Integer(3)), Cell::Number(3.0));
        assert_eq!(cell_from_value(ValueRef::Real(2.5)), Cell::Number(2.5));
        assert_eq!(cell_from_value(ValueRef::Text(b"1.5")), Cell::Text("1.5"));
        assert_eq!(cell_from_value(ValueRef::Blob(&[0xff, 0xfe])), Cell::Null);
        assert_eq!(cell_from_value(ValueRef::Null), Cell::Null);
    }

    #[test]
    fn test_grouped_query() {
        let conn = connection();
        assert_eq!(register_all(&conn).unwrap(), registry::list_aggregates().len());

        let mut stmt = conn
            .prepare("SELECT g, amean(x), hasnan(x), var(x) FROM t GROUP BY g ORDER BY g")
            .unwrap();
        let rows: Vec<(String, Option<f64>, i64, Option<f64>)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(
            rows,
            vec![
                ("a".to_string(), Some(1.5), 0, Some(0.5)),
                ("b".to_string(), Some(10.0), 0, None),
                ("c".to_string(), None, 0, None),
            ]
        );
    }

    #[test]
    fn test_empty_table_uses_fresh_accumulator() {
        let conn = connection();
        register_all(&conn).unwrap();
        let (mean, flag): (Option<f64>, i64) = conn
            .query_row("SELECT amean(x), hasinf(x) FROM t WHERE 0", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(mean, None);
        assert_eq!(flag, 0);
    }

    #[test]
    fn test_parameter_errors_reach_sqlite() {
        let conn = connection();
        register_all(&conn).unwrap();

        let err = conn
            .query_row("SELECT gmean(x, 5) FROM t", [], |row| row.get::<_, Option<f64>>(0))
            .unwrap_err();
        assert!(err.to_string().contains("gmean"), "{err}");

        let err = conn
            .query_row("SELECT variance(x, 'both') FROM t", [], |row| {
                row.get::<_, Option<f64>>(0)
            })
            .unwrap_err();
        assert!(err.to_string().contains("both"), "{err}");
    }

    #[test]
    fn test_selection() {
        let conn = connection();
        let config = RegistrationConfig::default()
            .with_include(["median"])
            .with_deterministic(false);
        assert_eq!(register_aggregates(&conn, &config).unwrap(), 1);
        assert!(conn.prepare("SELECT mode(x) FROM t").is_err());

        let config = RegistrationConfig::default().with_include(["nope"]);
        assert!(matches!(
            register_aggregates(&conn, &config),
            Err(AggregateError::UnknownAggregate(_))
        ));
    }

    #[test]
    fn test_frecency_is_never_deterministic() {
        let config = RegistrationConfig::default();
        let median = function_flags(registry::lookup("median").unwrap(), &config);
        assert!(median.contains(FunctionFlags::SQLITE_DETERMINISTIC));

        let frecency = function_flags(registry::lookup("frecency").unwrap(), &config);
        assert!(frecency.contains(FunctionFlags::SQLITE_UTF8));
        assert!(!frecency.contains(FunctionFlags::SQLITE_DETERMINISTIC));

        let config = config.with_deterministic(false);
        let median = function_flags(registry::lookup("median").unwrap(), &config);
        assert!(!median.contains(FunctionFlags::SQLITE_DETERMINISTIC));
    }
}
