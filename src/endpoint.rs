/// HTTP endpoint for querying the climate dataset
///
/// Read-only JSON API over station metadata and daily measurements.
///
/// Endpoints:
/// - GET /                           - HTML list of available routes
/// - GET /api/v1.0/precipitation     - Last 12 months of precipitation by date
/// - GET /api/v1.0/stations          - All station codes
/// - GET /api/v1.0/tobs              - Temperature summary for the configured station
/// - GET /api/v1.0/{start}           - TMIN/TAVG/TMAX from a date onward
/// - GET /api/v1.0/{start}/{end}     - TMIN/TAVG/TMAX over an inclusive date range
///
/// Each request opens its own database session, which closes when the
/// handler returns.

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use threadpool::ThreadPool;

use crate::config::{ServiceConfig, StationSelector};
use crate::db::{DbError, Session};
use crate::model::{DATE_FORMAT, StationTemperatureResponse, TemperatureRangeResponse};
use crate::queries;

const API_PREFIX: &str = "/api/v1.0/";

const AVAILABLE_ENDPOINTS: &[&str] = &[
    "/api/v1.0/precipitation",
    "/api/v1.0/stations",
    "/api/v1.0/tobs",
    "/api/v1.0/<start>",
    "/api/v1.0/<start>/<end>",
];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures surfaced to API clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid date {value:?}, expected YYYY-MM-DD")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Db(#[from] DbError),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::InvalidDate { .. } => 400,
            ApiError::NotFound(_) => 404,
            ApiError::Db(DbError::Timeout(_)) => 503,
            ApiError::Db(_) => 500,
        }
    }

    /// JSON body for the error. Database details stay in the log.
    pub fn body(&self) -> serde_json::Value {
        match self {
            ApiError::InvalidDate { value, .. } => serde_json::json!({
                "error": self.to_string(),
                "value": value,
            }),
            ApiError::NotFound(message) => serde_json::json!({ "error": message }),
            ApiError::Db(DbError::Timeout(_)) => serde_json::json!({ "error": "Query timed out" }),
            ApiError::Db(_) => serde_json::json!({ "error": "Internal server error" }),
        }
    }
}

/// The HTTP listener could not be started.
#[derive(Debug, Error)]
#[error("Failed to start HTTP server on {addr}: {message}")]
pub struct ServerError {
    pub addr: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// A recognised API route with its decoded path parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Index,
    Precipitation,
    Stations,
    Tobs,
    TemperatureFrom { start: String },
    TemperatureRange { start: String, end: String },
}

fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

/// Maps a request URL to a route, ignoring any query string and a single
/// trailing slash.
pub fn parse_route(url: &str) -> Option<Route> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    if path == "/" || path.is_empty() {
        return Some(Route::Index);
    }

    let path = path.strip_suffix('/').unwrap_or(path);
    let rest = path.strip_prefix(API_PREFIX)?;

    match rest {
        "precipitation" => Some(Route::Precipitation),
        "stations" => Some(Route::Stations),
        "tobs" => Some(Route::Tobs),
        _ => {
            let segments: Vec<&str> = rest.split('/').collect();
            match segments.as_slice() {
                [start] if !start.is_empty() => Some(Route::TemperatureFrom {
                    start: decode_segment(start),
                }),
                [start, end] if !start.is_empty() && !end.is_empty() => Some(Route::TemperatureRange {
                    start: decode_segment(start),
                    end: decode_segment(end),
                }),
                _ => None,
            }
        }
    }
}

/// Parses a date path parameter.
pub fn parse_request_date(value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|source| ApiError::InvalidDate {
        value: value.to_string(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// A rendered response, independent of the HTTP server.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl ApiResponse {
    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(body) => Self {
                status,
                content_type: "application/json",
                body,
            },
            Err(e) => {
                log::error!("Failed to serialize response: {}", e);
                Self {
                    status: 500,
                    content_type: "application/json",
                    body: r#"{"error": "Internal server error"}"#.to_string(),
                }
            }
        }
    }

    fn html(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body,
        }
    }

    fn from_error(err: &ApiError) -> Self {
        match err {
            ApiError::Db(e) => log::error!("{}", e),
            other => log::debug!("{}", other),
        }
        Self::json(err.status(), &err.body())
    }

    fn into_http(self) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
        let mut response = tiny_http::Response::from_data(self.body.into_bytes())
            .with_status_code(tiny_http::StatusCode::from(self.status));
        if let Ok(header) = tiny_http::Header::from_bytes(&b"Content-Type"[..], self.content_type.as_bytes()) {
            response.add_header(header);
        }
        response
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Handle / - plain listing of the API routes
fn handle_index() -> ApiResponse {
    let mut body = String::from("Available Routes:<br/>");
    let listed: Vec<String> = AVAILABLE_ENDPOINTS
        .iter()
        .map(|route| route.replace('<', "&lt;").replace('>', "&gt;"))
        .collect();
    body.push_str(&listed.join("<br/>"));
    ApiResponse::html(body)
}

/// Handle /api/v1.0/precipitation
pub fn handle_precipitation(session: &Session) -> Result<ApiResponse, ApiError> {
    let by_date = queries::precipitation_last_year(session)?
        .ok_or_else(|| ApiError::NotFound("No precipitation data available".to_string()))?;
    Ok(ApiResponse::json(200, &by_date))
}

/// Handle /api/v1.0/stations
pub fn handle_stations(session: &Session) -> Result<ApiResponse, ApiError> {
    let ids = queries::station_ids(session)?;
    Ok(ApiResponse::json(200, &ids))
}

/// Handle /api/v1.0/tobs
pub fn handle_tobs(session: &Session, selector: &StationSelector) -> Result<ApiResponse, ApiError> {
    let station = match selector {
        StationSelector::Fixed(code) => code.clone(),
        StationSelector::MostActive => queries::most_active_station(session)?
            .ok_or_else(|| ApiError::NotFound("No temperature data available".to_string()))?,
    };

    let stats = queries::station_temperature_stats(session, &station)?;
    if stats.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No temperature data for station {}",
            station
        )));
    }

    Ok(ApiResponse::json(200, &StationTemperatureResponse::from(stats)))
}

/// Handle /api/v1.0/{start} and /api/v1.0/{start}/{end}
pub fn handle_temperature_range(
    session: &Session,
    start: &str,
    end: Option<&str>,
) -> Result<ApiResponse, ApiError> {
    let start_date = parse_request_date(start)?;
    let end_date = end.map(parse_request_date).transpose()?;

    let stats = queries::temperature_stats_between(session, start_date, end_date)?;
    if stats.is_empty() {
        let message = match end {
            Some(end) => format!("No temperature data between {} and {}", start, end),
            None => format!("No temperature data on or after {}", start),
        };
        return Err(ApiError::NotFound(message));
    }

    Ok(ApiResponse::json(200, &TemperatureRangeResponse::new(start, end, stats)))
}

fn dispatch(config: &ServiceConfig, route: &Route) -> Result<ApiResponse, ApiError> {
    if *route == Route::Index {
        return Ok(handle_index());
    }

    // Dates are validated before touching the database.
    match route {
        Route::TemperatureFrom { start } => {
            parse_request_date(start)?;
        }
        Route::TemperatureRange { start, end } => {
            parse_request_date(start)?;
            parse_request_date(end)?;
        }
        _ => {}
    }

    let session = Session::open(&config.database_path, config.query_timeout())?;
    match route {
        Route::Index => Ok(handle_index()),
        Route::Precipitation => handle_precipitation(&session),
        Route::Stations => handle_stations(&session),
        Route::Tobs => handle_tobs(&session, &config.tobs_station),
        Route::TemperatureFrom { start } => handle_temperature_range(&session, start, None),
        Route::TemperatureRange { start, end } => handle_temperature_range(&session, start, Some(end)),
    }
}

/// Routes and answers one request.
pub fn handle_request(config: &ServiceConfig, method: &str, url: &str) -> ApiResponse {
    let started = Instant::now();

    let response = if !method.eq_ignore_ascii_case("GET") {
        ApiResponse::json(
            405,
            &serde_json::json!({ "error": format!("Method {} not allowed", method) }),
        )
    } else {
        match parse_route(url) {
            Some(route) => dispatch(config, &route).unwrap_or_else(|e| ApiResponse::from_error(&e)),
            None => ApiResponse::json(
                404,
                &serde_json::json!({
                    "error": "Not found",
                    "available_endpoints": AVAILABLE_ENDPOINTS,
                }),
            ),
        }
    };

    log::info!("{} {} -> {} ({:?})", method, url, response.status, started.elapsed());
    response
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Bind the HTTP listener described by `config`.
pub fn bind(config: &ServiceConfig) -> Result<tiny_http::Server, ServerError> {
    let addr = config.listen_addr();
    tiny_http::Server::http(&addr).map_err(|e| ServerError {
        addr,
        message: e.to_string(),
    })
}

/// Serve requests from `server` on a pool of `config.workers` threads.
///
/// Returns when the listener shuts down.
pub fn serve(server: tiny_http::Server, config: Arc<ServiceConfig>) {
    let pool = ThreadPool::new(config.workers);

    for request in server.incoming_requests() {
        let config = Arc::clone(&config);
        pool.execute(move || {
            let method = request.method().to_string();
            let url = request.url().to_string();
            let response = handle_request(&config, &method, &url);

            if let Err(e) = request.respond(response.into_http()) {
                log::warn!("Failed to send response for {}: {}", url, e);
            }
        });
    }

    pool.join();
}

/// Start the HTTP endpoint server and block serving requests.
pub fn start_endpoint_server(config: ServiceConfig) -> Result<(), ServerError> {
    let server = bind(&config)?;

    log::info!("HTTP endpoint listening on http://{}", config.listen_addr());
    for route in AVAILABLE_ENDPOINTS {
        log::info!("   GET {}", route);
    }

    serve(server, Arc::new(config));
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
