/// End-to-end test: binds the real HTTP server on an ephemeral port and
/// talks to it over TCP.
///
/// Run with: cargo test --test http_server

mod common;

use climate_service::endpoint;
use std::sync::Arc;

fn start_server(dataset: &common::TestDataset) -> String {
    let server = endpoint::bind(&dataset.config).expect("server should bind");
    let addr = server
        .server_addr()
        .to_ip()
        .expect("listener should have an IP address");

    let config = Arc::new(dataset.config.clone());
    std::thread::spawn(move || endpoint::serve(server, config));

    format!("http://{}", addr)
}

#[test]
fn test_server_answers_every_route() {
    let dataset = common::seeded_dataset();
    let base = start_server(&dataset);
    let client = reqwest::blocking::Client::new();

    let index = client.get(format!("{}/", base)).send().expect("index request");
    assert_eq!(index.status().as_u16(), 200);
    let content_type = index
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/html"), "got {}", content_type);

    let stations: Vec<String> = client
        .get(format!("{}/api/v1.0/stations", base))
        .send()
        .and_then(|r| r.json())
        .expect("stations request");
    assert_eq!(stations.len(), common::STATION_COUNT);

    let range: serde_json::Value = client
        .get(format!("{}/api/v1.0/2017-01-01/2017-01-31", base))
        .send()
        .and_then(|r| r.json())
        .expect("range request");
    assert_eq!(range["TMIN"].as_f64(), Some(60.0));
    assert_eq!(range["End Date"], "2017-01-31");

    let bad = client
        .get(format!("{}/api/v1.0/not-a-date", base))
        .send()
        .expect("bad date request");
    assert_eq!(bad.status().as_u16(), 400);

    let not_allowed = client
        .post(format!("{}/api/v1.0/stations", base))
        .send()
        .expect("post request");
    assert_eq!(not_allowed.status().as_u16(), 405);
}

#[test]
fn test_server_handles_concurrent_requests() {
    let dataset = common::seeded_dataset();
    let base = start_server(&dataset);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let url = format!("{}/api/v1.0/tobs", base);
            std::thread::spawn(move || {
                reqwest::blocking::get(url)
                    .map(|r| r.status().as_u16())
                    .unwrap_or(0)
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().expect("request thread"), 200);
    }
}
