#![allow(dead_code)]

/// Shared setup for integration tests: a seeded dataset file on disk.
///
/// Waihee (USC00519281) has daily rows for 2017-08-01..=2017-08-23 with
/// tobs 70..=80 cycling, Waikiki (USC00519397) has three January 2017 rows
/// plus one in 2016 and one in February, and Kaneohe (USC00513117) has no
/// measurements.

use climate_service::config::ServiceConfig;
use rusqlite::{Connection, params};
use std::path::Path;
use tempfile::TempDir;

pub const WAIHEE: &str = "USC00519281";
pub const STATION_COUNT: usize = 3;

/// Waihee tobs for 2017-08-01..=2017-08-23.
pub fn waihee_tobs() -> Vec<f64> {
    (0..23).map(|i| 70.0 + f64::from(i % 11)).collect()
}

pub struct TestDataset {
    // Keeps the directory alive for the duration of the test.
    _dir: TempDir,
    pub config: ServiceConfig,
}

fn create_schema(conn: &Connection) {
    conn.execute_batch(
        "CREATE TABLE station (
            id INTEGER PRIMARY KEY,
            station TEXT,
            name TEXT,
            latitude FLOAT,
            longitude FLOAT,
            elevation FLOAT
        );
        CREATE TABLE measurement (
            id INTEGER PRIMARY KEY,
            station TEXT,
            date TEXT,
            prcp FLOAT,
            tobs FLOAT
        );",
    )
    .expect("schema should be created");
}

fn insert(conn: &Connection, station: &str, date: &str, prcp: Option<f64>, tobs: f64) {
    conn.execute(
        "INSERT INTO measurement (station, date, prcp, tobs) VALUES (?1, ?2, ?3, ?4)",
        params![station, date, prcp, tobs],
    )
    .expect("measurement insert should succeed");
}

fn dataset_at(dir: TempDir, file: &Path) -> TestDataset {
    let config = ServiceConfig {
        database_path: file.to_path_buf(),
        bind_address: "127.0.0.1".to_string(),
        port: 0,
        workers: 2,
        ..ServiceConfig::default()
    };
    TestDataset { _dir: dir, config }
}

/// A dataset with both tables and no rows.
pub fn empty_dataset() -> TestDataset {
    let dir = tempfile::tempdir().expect("temp dir");
    let file = dir.path().join("hawaii.sqlite");
    let conn = Connection::open(&file).expect("database file");
    create_schema(&conn);
    drop(conn);
    dataset_at(dir, &file)
}

pub fn seeded_dataset() -> TestDataset {
    let dir = tempfile::tempdir().expect("temp dir");
    let file = dir.path().join("hawaii.sqlite");
    let conn = Connection::open(&file).expect("database file");
    create_schema(&conn);

    for (code, name) in [
        ("USC00519397", "WAIKIKI 717.2, HI US"),
        ("USC00513117", "KANEOHE 838.1, HI US"),
        (WAIHEE, "WAIHEE 837.5, HI US"),
    ] {
        conn.execute(
            "INSERT INTO station (station, name, latitude, longitude, elevation)
             VALUES (?1, ?2, 21.4, -157.8, 10.0)",
            params![code, name],
        )
        .expect("station insert should succeed");
    }

    for (i, tobs) in waihee_tobs().into_iter().enumerate() {
        insert(&conn, WAIHEE, &format!("2017-08-{:02}", i + 1), Some(0.05), tobs);
    }

    insert(&conn, "USC00519397", "2016-06-30", Some(1.2), 74.0);
    insert(&conn, "USC00519397", "2017-01-01 00:00:00.000000", Some(0.0), 64.0);
    insert(&conn, "USC00519397", "2017-01-16", None, 60.0);
    insert(&conn, "USC00519397", "2017-01-31", Some(0.7), 71.0);
    insert(&conn, "USC00519397", "2017-02-01", Some(0.0), 77.0);

    drop(conn);
    dataset_at(dir, &file)
}
