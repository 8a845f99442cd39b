/// Test fixtures: a small dataset with the same shape as hawaii.sqlite.
///
/// Layout of the seeded data:
///   USC00519281 (Waihee)   2017-08-01..=2017-08-23, tobs = 75 + day % 5
///                          → min 75, max 79, avg 77; prcp 0.1 except
///                          2017-08-05 which is NULL. Most rows of any station.
///   USC00519397 (Waikiki)  2016-08-22 (just outside the precipitation window),
///                          2016-08-23 (window start), 2016-12-31,
///                          2017-01-05 / 2017-01-15 / 2017-01-31 (tobs 62/66/70),
///                          2017-02-01, 2017-08-23 (collides with Waihee).
///   USC00513117 (Kaneohe)  one row stored as date-time text, 2017-03-10.
///   USC00517948 (Pearl City) has no measurements.

use rusqlite::{Connection, params};
use std::time::Duration;

use crate::db::Session;

pub(crate) const SCHEMA_SQL: &str = "
    CREATE TABLE station (
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
    );
";

pub(crate) const STATION_COUNT: usize = 4;
pub(crate) const WAIHEE: &str = "USC00519281";
pub(crate) const WAIKIKI: &str = "USC00519397";
pub(crate) const PEARL_CITY: &str = "USC00517948";

pub(crate) fn empty_connection() -> Connection {
    let conn = Connection::open_in_memory().expect("in-memory database");
    conn.execute_batch(SCHEMA_SQL).expect("schema");
    conn
}

pub(crate) fn seeded_connection() -> Connection {
    let conn = empty_connection();

    for (code, name, lat, lng, elev) in [
        (WAIKIKI, "WAIKIKI 717.2, HI US", 21.2716, -157.8168, 3.0),
        ("USC00513117", "KANEOHE 838.1, HI US", 21.4234, -157.8015, 14.6),
        (WAIHEE, "WAIHEE 837.5, HI US", 21.45167, -157.84889, 32.9),
        (PEARL_CITY, "PEARL CITY, HI US", 21.3934, -157.9751, 11.9),
    ] {
        conn.execute(
            "INSERT INTO station (station, name, latitude, longitude, elevation)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![code, name, lat, lng, elev],
        )
        .expect("insert station");
    }

    for day in 1..=23u32 {
        let prcp = if day == 5 { None } else { Some(0.1) };
        insert_measurement(
            &conn,
            WAIHEE,
            &format!("2017-08-{:02}", day),
            prcp,
            75.0 + f64::from(day % 5),
        );
    }

    insert_measurement(&conn, WAIKIKI, "2016-08-22", Some(9.9), 71.0);
    insert_measurement(&conn, WAIKIKI, "2016-08-23", Some(0.5), 72.0);
    insert_measurement(&conn, WAIKIKI, "2016-12-31", Some(0.0), 50.0);
    insert_measurement(&conn, WAIKIKI, "2017-01-05", Some(0.0), 62.0);
    insert_measurement(&conn, WAIKIKI, "2017-01-15", Some(0.3), 66.0);
    insert_measurement(&conn, WAIKIKI, "2017-01-31", None, 70.0);
    insert_measurement(&conn, WAIKIKI, "2017-02-01", Some(0.0), 80.0);
    insert_measurement(&conn, WAIKIKI, "2017-08-23", Some(0.45), 81.0);
    insert_measurement(&conn, "USC00513117", "2017-03-10 00:00:00.000000", Some(0.2), 68.0);

    conn
}

pub(crate) fn insert_measurement(conn: &Connection, station: &str, date: &str, prcp: Option<f64>, tobs: f64) {
    conn.execute(
        "INSERT INTO measurement (station, date, prcp, tobs) VALUES (?1, ?2, ?3, ?4)",
        params![station, date, prcp, tobs],
    )
    .expect("insert measurement");
}

pub(crate) fn seeded_session() -> Session {
    Session::from_connection(seeded_connection(), Duration::from_secs(5)).expect("session")
}

pub(crate) fn empty_session() -> Session {
    Session::from_connection(empty_connection(), Duration::from_secs(5)).expect("session")
}
