//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use datafusion::prelude::*;
use rusqlite::Connection;
use term_aggregates::host;

/// `1.1, 2.2, ..., 9.9, 10.10, ..., 14.14` as text.
pub fn dataset() -> Vec<String> {
    (1..15).map(|i| format!("{i}.{i}")).collect()
}

pub fn dataset_f64() -> Vec<f64> {
    dataset().iter().map(|text| text.parse().unwrap()).collect()
}

/// A SQLite table where every fixture column is filled by its own inserts,
/// so each column holds its values and NULL everywhere else.
///
/// - `t`: the dataset as TEXT
/// - `f`: the dataset as REAL
/// - `neg`: the negated dataset
/// - `empty`: NULL only
/// - `hasnan` / `hasinf`: the dataset with `'NaN'` / `'Inf'` in 7th place
/// - `modefive`: `1, 2, 3, 4, 5, 5, 5, 6, ..., 14`
pub fn fixture_connection() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE test(
            t text,
            i integer,
            f float,
            neg float,
            empty float,
            hasnan float,
            hasinf float,
            modefive float,
            n,
            b blob
        )",
    )
    .unwrap();

    let insert = |column: &str, values: Vec<String>| {
        let sql = format!("INSERT INTO test({column}) VALUES (?1)");
        let mut stmt = conn.prepare(&sql).unwrap();
        for value in values {
            stmt.execute([value]).unwrap();
        }
    };

    let data = dataset();
    insert("t", data.clone());
    insert("f", data.clone());
    insert("neg", data.iter().map(|v| format!("-{v}")).collect());

    let mut with_nan = data.clone();
    with_nan[6] = "NaN".to_string();
    insert("hasnan", with_nan);

    let mut with_inf = data;
    with_inf[6] = "Inf".to_string();
    insert("hasinf", with_inf);

    let modefive = (1..6)
        .chain([5])
        .chain(5..15)
        .map(|i| i.to_string())
        .collect();
    insert("modefive", modefive);

    host::sqlite::register_all(&conn).unwrap();
    conn
}

/// Runs `SELECT name(column) FROM test`.
pub fn select(conn: &Connection, name: &str, column: &str) -> Option<f64> {
    conn.query_row(&format!("SELECT {name}({column}) FROM test"), [], |row| row.get(0))
        .unwrap()
}

/// Asserts that `actual` matches `expected` to six decimal places; infinities
/// must match exactly.
pub fn assert_close(context: &str, actual: Option<f64>, expected: Option<f64>) {
    match (actual, expected) {
        (Some(a), Some(e)) if e.is_infinite() => assert_eq!(a, e, "{context}"),
        (Some(a), Some(e)) => assert!(
            (a - e).abs() < 1e-6,
            "{context}: expected {e}, got {a}"
        ),
        (None, None) => {}
        (actual, expected) => panic!("{context}: expected {expected:?}, got {actual:?}"),
    }
}

/// A single-partition DataFusion session with every aggregate registered and
/// a `data` table holding the fixture columns.
pub fn fixture_context() -> SessionContext {
    let config = SessionConfig::new().with_target_partitions(1);
    let ctx = SessionContext::new_with_config(config);
    host::datafusion::register_all(&ctx).unwrap();

    let values = dataset_f64();
    let negated: Vec<f64> = values.iter().map(|v| -v).collect();
    let text = dataset();
    let mut with_nan: Vec<String> = dataset();
    with_nan[6] = "NaN".to_string();

    let batch = RecordBatch::try_new(
        Arc::new(Schema::new(vec![
            Field::new("f", DataType::Float64, true),
            Field::new("neg", DataType::Float64, true),
            Field::new("t", DataType::Utf8, true),
            Field::new("hasnan", DataType::Utf8, true),
            Field::new("empty", DataType::Float64, true),
        ])),
        vec![
            Arc::new(Float64Array::from(values)) as ArrayRef,
            Arc::new(Float64Array::from(negated)) as ArrayRef,
            Arc::new(StringArray::from(text)) as ArrayRef,
            Arc::new(StringArray::from(with_nan)) as ArrayRef,
            Arc::new(Float64Array::from(vec![None::<f64>; 14])) as ArrayRef,
        ],
    )
    .unwrap();

    ctx.register_batch("data", batch).unwrap();
    ctx
}
