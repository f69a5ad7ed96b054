//! Reference results for every aggregate, replayed through SQLite.
//!
//! Each aggregate runs over the fixture columns of `common::fixture_connection`
//! and is compared against the published reference values.

mod common;

use common::{assert_close, fixture_connection, select};
use term_aggregates::host::sqlite::register_aggregates;
use term_aggregates::{list_aggregates, AggregateError, OutputKind};

const INF: f64 = f64::INFINITY;

struct Expectation {
    name: &'static str,
    float: Option<f64>,
    neg: Option<f64>,
    nan: Option<f64>,
    inf: Option<f64>,
}

const fn expect(
    name: &'static str,
    float: Option<f64>,
    neg: Option<f64>,
    nan: Option<f64>,
    inf: Option<f64>,
) -> Expectation {
    Expectation {
        name,
        float,
        neg,
        nan,
        inf,
    }
}

const EXPECTATIONS: &[Expectation] = &[
    expect(
        "datarange",
        Some(13.040000000000001),
        Some(13.040000000000001),
        Some(13.040000000000001),
        Some(INF),
    ),
    expect(
        "abs_mean",
        Some(7.864285714285715),
        Some(7.864285714285715),
        Some(7.876923076923077),
        Some(INF),
    ),
    expect(
        "geometric_mean",
        Some(6.450756824711689),
        None,
        Some(6.363511307721573),
        Some(INF),
    ),
    expect("median", Some(8.25), Some(-8.25), Some(8.8), Some(9.350000000000001)),
    expect(
        "varp",
        Some(15.976081632653049),
        Some(15.976081632653049),
        Some(17.20277514792899),
        None,
    ),
    expect(
        "var",
        Some(17.205010989010976),
        Some(17.205010989010976),
        Some(18.636339743589737),
        None,
    ),
    expect(
        "stdevp",
        Some(3.9970090858857263),
        Some(3.9970090858857263),
        Some(4.147622830963417),
        None,
    ),
    expect(
        "stdev",
        Some(4.14789235504141),
        Some(4.14789235504141),
        Some(4.316982712913006),
        None,
    ),
    expect(
        "sem",
        Some(1.108570862127418),
        Some(1.108570862127418),
        Some(1.1973155789768832),
        None,
    ),
    expect(
        "ci",
        Some(2.1727988897697394),
        Some(2.1727988897697394),
        Some(2.3467385347946914),
        None,
    ),
    expect(
        "rms",
        Some(8.821738571765286),
        Some(8.821738571765286),
        Some(8.902173459762077),
        Some(INF),
    ),
    expect(
        "prod",
        Some(216047570729.97736),
        Some(216047570729.97736),
        Some(28058126068.82824),
        Some(INF),
    ),
    expect(
        "skew",
        Some(-0.1322935682076316),
        Some(0.1322935682076316),
        Some(-0.13664205273197477),
        None,
    ),
    expect(
        "kurt",
        Some(-1.1706824430972933),
        Some(-1.1706824430972933),
        Some(-1.2992969632487026),
        None,
    ),
];

#[test]
fn test_reference_columns() {
    let conn = fixture_connection();
    for e in EXPECTATIONS {
        assert_close(&format!("{}(f)", e.name), select(&conn, e.name, "f"), e.float);
        assert_close(&format!("{}(t)", e.name), select(&conn, e.name, "t"), e.float);
        assert_close(&format!("{}(neg)", e.name), select(&conn, e.name, "neg"), e.neg);
        assert_close(&format!("{}(hasnan)", e.name), select(&conn, e.name, "hasnan"), e.nan);
        assert_close(&format!("{}(hasinf)", e.name), select(&conn, e.name, "hasinf"), e.inf);
    }
}

#[test]
fn test_empty_column_is_null_or_false() {
    let conn = fixture_connection();
    for entry in list_aggregates().iter().filter(|e| e.arity() == 1) {
        let sql = format!("SELECT {}(empty) FROM test", entry.name());
        match entry.output() {
            OutputKind::Boolean => {
                let flag: bool = conn.query_row(&sql, [], |row| row.get(0)).unwrap();
                assert!(!flag, "{}", entry.name());
            }
            OutputKind::Float => {
                let value: Option<f64> = conn.query_row(&sql, [], |row| row.get(0)).unwrap();
                assert_eq!(value, None, "{}", entry.name());
            }
        }
    }
}

#[test]
fn test_presence_flags() {
    let conn = fixture_connection();
    let flag = |name: &str, column: &str| -> bool {
        conn.query_row(&format!("SELECT {name}({column}) FROM test"), [], |row| {
            row.get(0)
        })
        .unwrap()
    };

    for column in ["f", "t", "neg", "empty", "hasinf"] {
        assert!(!flag("hasnan", column), "hasnan({column})");
    }
    assert!(flag("hasnan", "hasnan"));

    for column in ["f", "t", "neg", "empty", "hasnan"] {
        assert!(!flag("hasinf", column), "hasinf({column})");
    }
    assert!(flag("hasinf", "hasinf"));
}

#[test]
fn test_mode_and_median_of_modefive() {
    let conn = fixture_connection();
    assert_eq!(select(&conn, "mode", "modefive"), Some(5.0));
    assert_eq!(select(&conn, "median", "modefive"), Some(6.5));
}

#[test]
fn test_static_parameters() {
    let conn = fixture_connection();
    let query = |sql: &str| -> Option<f64> { conn.query_row(sql, [], |row| row.get(0)).unwrap() };

    let sample = query("SELECT variance(f, 'sample') FROM test");
    let population = query("SELECT variance(f, 'Population') FROM test");
    assert_close("variance sample", sample, Some(17.205010989010976));
    assert_close("variance population", population, Some(15.976081632653049));

    let sdev = query("SELECT sdev(f, 'TRUE') FROM test");
    assert_close("sdev population", sdev, Some(3.9970090858857263));

    let quadratic = query("SELECT gmean(f, 2) FROM test");
    let rms = query("SELECT rms(f) FROM test");
    assert_close("gmean(f, 2)", quadratic, rms);
}

#[test]
fn test_documented_tables() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    term_aggregates::host::sqlite::register_all(&conn).unwrap();
    conn.execute_batch(
        "CREATE TABLE table1(a, b);
         INSERT INTO table1 VALUES (2, 1), (2, 2), (1, 2),
             ('text is ignored, as well as null values', 3), ('none', 2),
             (1, 'text is ignored, as well as null values'), (2, 'none'), (2, 3);
         CREATE TABLE table2(a);
         INSERT INTO table2 VALUES (34), (27), (45), (55), (22), (34);
         CREATE TABLE actions(a, points);
         INSERT INTO actions VALUES ('2009-06-01', 1), ('2009-08-28', 2), ('2009-09-17', 3);",
    )
    .unwrap();

    let query = |sql: &str| -> Option<f64> { conn.query_row(sql, [], |row| row.get(0)).unwrap() };

    assert_eq!(query("SELECT wamean(a, b) FROM table1"), Some(2.0));
    assert_close("gmean p=1", query("SELECT gmean(a, 1) FROM table2"), Some(36.1666666667));
    assert_close("gmean p=0", query("SELECT gmean(a, 0) FROM table2"), Some(34.5451100372));
    assert_close("gmean", query("SELECT gmean(a) FROM table2"), Some(34.5451100372));
    assert_close("gmean p=-1", query("SELECT gmean(a, -1) FROM table2"), Some(33.0179836512));
    assert_close("gmean p=2", query("SELECT gmean(a, 2) FROM table2"), Some(37.8043207407));
    assert_close(
        "frecency",
        query("SELECT frecency(a, 'now:2009-09-26 04:38:30') FROM actions"),
        Some(200.0),
    );
    assert_close(
        "frecency points",
        query("SELECT frecency(a, 10, 'now:2009-09-26 04:38:30') FROM actions"),
        Some(20.0),
    );

    conn.execute_batch("DELETE FROM table1").unwrap();
    assert_eq!(query("SELECT wamean(a, b) FROM table1"), None);
}

#[test]
fn test_pearson_over_sqlite() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    term_aggregates::host::sqlite::register_all(&conn).unwrap();
    conn.execute_batch(
        "CREATE TABLE r(value INTEGER);
         WITH RECURSIVE seq(v) AS (SELECT 1 UNION ALL SELECT v + 1 FROM seq WHERE v < 90)
         INSERT INTO r SELECT v FROM seq;",
    )
    .unwrap();

    let query = |sql: &str| -> Option<f64> { conn.query_row(sql, [], |row| row.get(0)).unwrap() };
    assert_close(
        "pearson(value, 1/value)",
        query("SELECT pearson(value, 1/value) FROM r"),
        Some(-0.18156825980064048),
    );
    assert_close(
        "pearson(value, 17*value+5)",
        query("SELECT pearson(value, 17*value+5) FROM r"),
        Some(1.0),
    );
}

#[test]
fn test_configuration_errors_abort_the_query() {
    let conn = fixture_connection();
    let result = conn.query_row("SELECT gmean(neg, 0) FROM test", [], |row| {
        row.get::<_, Option<f64>>(0)
    });
    let err = result.unwrap_err();
    assert!(err.to_string().contains("outside the domain"), "{err}");

    let result = conn.query_row("SELECT gmean(f, 3) FROM test", [], |row| {
        row.get::<_, Option<f64>>(0)
    });
    assert!(result.is_err());
}

#[test]
fn test_registration_rejects_unknown_names() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    let config = term_aggregates::config::RegistrationConfig::default().with_exclude(["nope"]);
    assert!(matches!(
        register_aggregates(&conn, &config),
        Err(AggregateError::UnknownAggregate(_))
    ));
}
