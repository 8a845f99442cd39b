/// climate_service: read-only HTTP API over the Hawaii climate dataset.
///
/// # Module structure
///
/// ```text
/// climate_service
/// ├── model     — dataset records (Station, Measurement) and response types
/// ├── config    — service configuration loader (climate.toml + CLIMATE_* env)
/// ├── db        — per-request read-only sessions with a query deadline
/// ├── queries   — precipitation, station and temperature aggregate queries
/// ├── endpoint  — routing, handlers and the tiny_http server
/// └── fixtures (test only) — seeded in-memory dataset
/// ```

/// Public modules
pub mod config;
pub mod db;
pub mod endpoint;
pub mod model;
pub mod queries;

#[cfg(test)]
pub(crate) mod fixtures;
