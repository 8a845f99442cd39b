/// Dataset queries backing the API endpoints.
///
/// All date filtering goes through SQLite's `date()` so rows stored either as
/// `YYYY-MM-DD` or as date-time text compare correctly, and every date read
/// back out is normalized to a `NaiveDate` before it reaches a handler.

use chrono::{Months, NaiveDate};
use rusqlite::{OptionalExtension, params};

use crate::db::{DbError, Session};
use crate::model::{DATE_FORMAT, Measurement, PrecipitationByDate, Station, TemperatureStats};

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Parses a stored date, accepting a plain date or a date-time whose first
/// ten characters are the date.
pub fn normalize_date(raw: &str) -> Result<NaiveDate, DbError> {
    let raw = raw.trim();
    let date_part = match raw.len() {
        10 => Some(raw),
        n if n > 10 && matches!(raw.as_bytes()[10], b' ' | b'T') => raw.get(..10),
        _ => None,
    };

    date_part
        .and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok())
        .ok_or_else(|| DbError::Decode {
            column: "date",
            value: raw.to_string(),
        })
}

fn sql_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// First day of the precipitation window ending at `latest`: twelve calendar
/// months back, clamped to the end of the month.
pub fn one_year_before(latest: NaiveDate) -> NaiveDate {
    latest
        .checked_sub_months(Months::new(12))
        .unwrap_or(NaiveDate::MIN)
}

// ---------------------------------------------------------------------------
// Stations
// ---------------------------------------------------------------------------

/// All stations in storage order.
pub fn list_stations(session: &Session) -> Result<Vec<Station>, DbError> {
    let mut stmt = session
        .prepare(
            "SELECT station, name, latitude, longitude, elevation
             FROM station
             ORDER BY rowid",
        )
        .map_err(|e| session.classify(e))?;

    let stations = stmt
        .query_map([], |row| {
            Ok(Station {
                station: row.get(0)?,
                name: row.get(1)?,
                latitude: row.get(2)?,
                longitude: row.get(3)?,
                elevation: row.get(4)?,
            })
        })
        .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
        .map_err(|e| session.classify(e))?;

    Ok(stations)
}

/// Station codes in storage order.
pub fn station_ids(session: &Session) -> Result<Vec<String>, DbError> {
    Ok(list_stations(session)?
        .into_iter()
        .map(|s| s.station)
        .collect())
}

/// The station with the most measurement rows; ties go to the lowest code.
pub fn most_active_station(session: &Session) -> Result<Option<String>, DbError> {
    session
        .query_row(
            "SELECT station, COUNT(*) AS observations
             FROM measurement
             GROUP BY station
             ORDER BY observations DESC, station ASC
             LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| session.classify(e))
}

// ---------------------------------------------------------------------------
// Measurements
// ---------------------------------------------------------------------------

/// Most recent measurement date in the dataset, if there are any rows.
pub fn latest_measurement_date(session: &Session) -> Result<Option<NaiveDate>, DbError> {
    let raw: Option<String> = session
        .query_row("SELECT MAX(date(date)) FROM measurement", [], |row| row.get(0))
        .map_err(|e| session.classify(e))?;

    raw.as_deref().map(normalize_date).transpose()
}

/// Measurements with `start <= date <= end`, in storage order.
pub fn measurements_between(
    session: &Session,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Measurement>, DbError> {
    let mut stmt = session
        .prepare(
            "SELECT station, date, prcp, tobs
             FROM measurement
             WHERE date(date) BETWEEN ?1 AND ?2
             ORDER BY rowid",
        )
        .map_err(|e| session.classify(e))?;

    let raw_rows = stmt
        .query_map(params![sql_date(start), sql_date(end)], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<f64>>(2)?,
                row.get::<_, Option<f64>>(3)?,
            ))
        })
        .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
        .map_err(|e| session.classify(e))?;

    raw_rows
        .into_iter()
        .map(|(station, date, prcp, tobs)| {
            Ok(Measurement {
                station,
                date: normalize_date(&date)?,
                prcp,
                tobs,
            })
        })
        .collect()
}

/// Precipitation for the twelve months ending at the latest measurement.
///
/// Returns `None` when the dataset has no measurements. Several stations
/// reporting the same day collapse to one key; the last row read wins.
pub fn precipitation_last_year(session: &Session) -> Result<Option<PrecipitationByDate>, DbError> {
    let Some(latest) = latest_measurement_date(session)? else {
        return Ok(None);
    };
    let start = one_year_before(latest);

    let mut by_date = PrecipitationByDate::new();
    for m in measurements_between(session, start, latest)? {
        by_date.insert(sql_date(m.date), m.prcp);
    }

    Ok(Some(by_date))
}

// ---------------------------------------------------------------------------
// Temperature aggregates
// ---------------------------------------------------------------------------

fn stats_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TemperatureStats> {
    Ok(TemperatureStats {
        count: row.get(0)?,
        min: row.get(1)?,
        avg: row.get(2)?,
        max: row.get(3)?,
    })
}

/// Min/avg/max `tobs` for one station over all of its measurements.
pub fn station_temperature_stats(session: &Session, station: &str) -> Result<TemperatureStats, DbError> {
    session
        .query_row(
            "SELECT COUNT(tobs), MIN(tobs), AVG(tobs), MAX(tobs)
             FROM measurement
             WHERE station = ?1",
            params![station],
            stats_from_row,
        )
        .map_err(|e| session.classify(e))
}

/// Min/avg/max `tobs` across all stations from `start`, through `end`
/// inclusive when given.
pub fn temperature_stats_between(
    session: &Session,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> Result<TemperatureStats, DbError> {
    let result = match end {
        Some(end) => session.query_row(
            "SELECT COUNT(tobs), MIN(tobs), AVG(tobs), MAX(tobs)
             FROM measurement
             WHERE date(date) BETWEEN ?1 AND ?2",
            params![sql_date(start), sql_date(end)],
            stats_from_row,
        ),
        None => session.query_row(
            "SELECT COUNT(tobs), MIN(tobs), AVG(tobs), MAX(tobs)
             FROM measurement
             WHERE date(date) >= ?1",
            params![sql_date(start)],
            stats_from_row,
        ),
    };

    result.map_err(|e| session.classify(e))
}

// ---------------------------------------------------------------------------
// Dataset summary
// ---------------------------------------------------------------------------

/// Row counts and date coverage, reported by the `check` command.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub stations: i64,
    pub measurements: i64,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

pub fn dataset_summary(session: &Session) -> Result<DatasetSummary, DbError> {
    let (stations, measurements, first, last): (i64, i64, Option<String>, Option<String>) = session
        .query_row(
            "SELECT
                (SELECT COUNT(*) FROM station),
                (SELECT COUNT(*) FROM measurement),
                (SELECT MIN(date(date)) FROM measurement),
                (SELECT MAX(date(date)) FROM measurement)",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .map_err(|e| session.classify(e))?;

    Ok(DatasetSummary {
        stations,
        measurements,
        first_date: first.as_deref().map(normalize_date).transpose()?,
        last_date: last.as_deref().map(normalize_date).transpose()?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
