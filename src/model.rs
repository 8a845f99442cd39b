/// Shared data types for the climate dataset and API responses.
///
/// `Station` and `Measurement` mirror the two tables of the dataset and are
/// decoded explicitly from rows. The response types serialize to the exact
/// JSON key names the API publishes, so handlers never build ad-hoc maps.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Wire format for every date the API accepts or emits.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Station used by `/api/v1.0/tobs` unless configured otherwise.
pub const DEFAULT_TOBS_STATION: &str = "USC00519281";

// ---------------------------------------------------------------------------
// Dataset records
// ---------------------------------------------------------------------------

/// One weather-observation location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    /// Unique station code, e.g. `USC00519281`.
    pub station: String,
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub elevation: Option<f64>,
}

/// One daily observation for a station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub station: String,
    pub date: NaiveDate,
    /// Precipitation; missing in the source data for some days.
    pub prcp: Option<f64>,
    /// Temperature observation.
    pub tobs: Option<f64>,
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Min/avg/max of `tobs` over some set of measurements.
///
/// `count` is the number of non-null `tobs` values aggregated; when it is
/// zero the three statistics are `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureStats {
    pub count: i64,
    pub min: Option<f64>,
    pub avg: Option<f64>,
    pub max: Option<f64>,
}

impl TemperatureStats {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Date → precipitation, keyed by `YYYY-MM-DD`.
pub type PrecipitationByDate = BTreeMap<String, Option<f64>>;

/// Response for `/api/v1.0/tobs`.
#[derive(Debug, Serialize)]
pub struct StationTemperatureResponse {
    #[serde(rename = "Lowest Temperature")]
    pub lowest: Option<f64>,
    #[serde(rename = "Highest Temperature")]
    pub highest: Option<f64>,
    #[serde(rename = "Average Temperature")]
    pub average: Option<f64>,
}

impl From<TemperatureStats> for StationTemperatureResponse {
    fn from(stats: TemperatureStats) -> Self {
        Self {
            lowest: stats.min,
            highest: stats.max,
            average: stats.avg,
        }
    }
}

/// Response for `/api/v1.0/<start>` and `/api/v1.0/<start>/<end>`.
///
/// The dates are echoed back exactly as the client sent them.
#[derive(Debug, Serialize)]
pub struct TemperatureRangeResponse {
    #[serde(rename = "Start Date")]
    pub start_date: String,
    #[serde(rename = "End Date", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(rename = "TMIN")]
    pub tmin: Option<f64>,
    #[serde(rename = "TAVG")]
    pub tavg: Option<f64>,
    #[serde(rename = "TMAX")]
    pub tmax: Option<f64>,
}

impl TemperatureRangeResponse {
    pub fn new(start_date: &str, end_date: Option<&str>, stats: TemperatureStats) -> Self {
        Self {
            start_date: start_date.to_string(),
            end_date: end_date.map(str::to_string),
            tmin: stats.min,
            tavg: stats.avg,
            tmax: stats.max,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
