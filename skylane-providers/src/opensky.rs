use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{error, warn};

use skylane_core::offer::{Airport, FlightOffer, OfferSource, FIELD_UNAVAILABLE};
use skylane_core::provider::{FlightProvider, ProviderError, ProviderResult, RouteQuery};

use crate::RESULT_LIMIT;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_BASE_URL: &str = "https://opensky-network.org/api";

/// OpenSky Network departures feed. Free, unauthenticated, tracking data
/// only: no pricing and no airport search. Departure data exists only for
/// a window around the present, so far-past/far-future dates are refused
/// before any request goes out.
pub struct OpenSkyClient {
    http: reqwest::Client,
    base_url: String,
}

impl OpenSkyClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Default for OpenSkyClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlightProvider for OpenSkyClient {
    fn name(&self) -> &'static str {
        "opensky"
    }

    async fn search_flights(&self, query: &RouteQuery) -> ProviderResult<Vec<FlightOffer>> {
        if query.origin.is_empty() || query.destination.is_empty() {
            return Err(ProviderError::MissingParams("origin and destination"));
        }

        let Some(departure_start) = query.date.and_hms_opt(0, 0, 0) else {
            return Err(ProviderError::MissingParams("date"));
        };
        let departure_start = departure_start.and_utc();

        let now = Utc::now();
        if departure_start < now - ChronoDuration::days(1) {
            warn!("departure date {} is too far in the past for OpenSky", query.date);
            return Err(ProviderError::NotFound);
        }
        if departure_start > now + ChronoDuration::days(30) {
            warn!("departure date {} is too far in the future for OpenSky", query.date);
            return Err(ProviderError::NotFound);
        }

        let begin = departure_start.timestamp();
        let end = (departure_start + ChronoDuration::days(1)).timestamp();

        let url = format!("{}/flights/departure", self.base_url);
        let response = self
            .http
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .query(&[
                ("airport", query.origin.to_ascii_uppercase()),
                ("begin", begin.to_string()),
                ("end", end.to_string()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Transient(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {}
            // No departure data for this airport/window.
            StatusCode::NOT_FOUND => return Ok(Vec::new()),
            StatusCode::TOO_MANY_REQUESTS => return Err(ProviderError::RateLimited),
            status => {
                error!("OpenSky request failed: HTTP {status}");
                return Err(ProviderError::Transient(format!("HTTP {status}")));
            }
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Transient(format!("invalid response body: {e}")))?;
        let items = body
            .as_array()
            .ok_or_else(|| ProviderError::Transient("unexpected response shape".to_string()))?;

        Ok(map_departures(items, &query.origin, &query.destination))
    }

    async fn search_airports(&self, _keyword: &str) -> ProviderResult<Vec<Airport>> {
        Err(ProviderError::Unsupported)
    }
}

fn map_departures(items: &[Value], origin: &str, destination: &str) -> Vec<FlightOffer> {
    items
        .iter()
        .take(RESULT_LIMIT)
        .filter_map(|item| match map_single_departure(item, origin, destination) {
            Some(offer) => Some(offer),
            None => {
                warn!("skipping OpenSky record with invalid timing data: {item}");
                None
            }
        })
        .collect()
}

fn map_single_departure(item: &Value, origin: &str, destination: &str) -> Option<FlightOffer> {
    let first_seen = item.get("firstSeen").and_then(Value::as_i64).unwrap_or(0);
    let last_seen = item.get("lastSeen").and_then(Value::as_i64).unwrap_or(0);
    if first_seen == 0 || last_seen <= first_seen {
        return None;
    }

    let duration_seconds = last_seen - first_seen;
    let hours = duration_seconds / 3600;
    let minutes = (duration_seconds % 3600) / 60;

    let departure_time = DateTime::<Utc>::from_timestamp(first_seen, 0)?;
    let arrival_time = DateTime::<Utc>::from_timestamp(last_seen, 0)?;

    let callsign = item
        .get("callsign")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(FIELD_UNAVAILABLE);

    Some(FlightOffer {
        id: item
            .get("icao24")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        flight_number: callsign.to_string(),
        origin: origin.to_string(),
        // The feed does not confirm the arrival airport; this echoes the
        // searched destination.
        destination: destination.to_string(),
        departure_time: departure_time.to_rfc3339(),
        arrival_time: arrival_time.to_rfc3339(),
        duration: format!("PT{hours}H{minutes}M"),
        stops: 0,
        price: 0.0,
        currency: FIELD_UNAVAILABLE.to_string(),
        airline: FIELD_UNAVAILABLE.to_string(),
        status: "unknown".to_string(),
        source: OfferSource::Live,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_maps_departure_with_iso_duration() {
        let items = vec![json!({
            "icao24": "a1b2c3",
            "callsign": "SWA123  ",
            "firstSeen": 1_756_700_000_i64,
            "lastSeen": 1_756_708_500_i64
        })];
        let offers = map_departures(&items, "JFK", "LHR");
        assert_eq!(offers.len(), 1);
        let offer = &offers[0];
        assert_eq!(offer.flight_number, "SWA123");
        // 8500 seconds = 2h 21m
        assert_eq!(offer.duration, "PT2H21M");
        assert_eq!(offer.currency, FIELD_UNAVAILABLE);
    }

    #[test]
    fn test_invalid_timing_records_are_skipped() {
        let items = vec![
            json!({"icao24": "x", "firstSeen": 0, "lastSeen": 100}),
            json!({"icao24": "y", "firstSeen": 200, "lastSeen": 100}),
            json!({"icao24": "z", "firstSeen": 1_756_700_000_i64, "lastSeen": 1_756_703_600_i64}),
        ];
        let offers = map_departures(&items, "JFK", "LHR");
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].id, "z");
        assert_eq!(offers[0].flight_number, FIELD_UNAVAILABLE);
    }
}
