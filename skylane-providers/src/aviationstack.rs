use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{error, info, warn};

use skylane_core::offer::{Airport, FlightOffer, OfferSource, FIELD_UNAVAILABLE};
use skylane_core::provider::{FlightProvider, ProviderError, ProviderResult, RouteQuery};

use crate::RESULT_LIMIT;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_BASE_URL: &str = "http://api.aviationstack.com/v1";

/// AviationStack real-time flight feed. Provides tracking data only: no
/// pricing, no duration, and no airport search.
pub struct AviationStackClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AviationStackClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[async_trait]
impl FlightProvider for AviationStackClient {
    fn name(&self) -> &'static str {
        "aviationstack"
    }

    async fn search_flights(&self, query: &RouteQuery) -> ProviderResult<Vec<FlightOffer>> {
        if query.origin.is_empty() || query.destination.is_empty() {
            return Err(ProviderError::MissingParams("origin and destination"));
        }

        let url = format!("{}/flights", self.base_url);
        let response = self
            .http
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .query(&[
                ("access_key", self.api_key.clone()),
                ("dep_iata", query.origin.to_ascii_uppercase()),
                ("arr_iata", query.destination.to_ascii_uppercase()),
                ("flight_date", query.date.to_string()),
                ("limit", RESULT_LIMIT.to_string()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Transient(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::UNAUTHORIZED => {
                error!("AviationStack authentication failed, check API key");
                return Err(ProviderError::Unauthorized);
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(ProviderError::RateLimited),
            status => {
                error!("AviationStack request failed: HTTP {status}");
                return Err(ProviderError::Transient(format!("HTTP {status}")));
            }
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Transient(format!("invalid response body: {e}")))?;
        let items = body
            .get("data")
            .and_then(Value::as_array)
            .ok_or(ProviderError::NotFound)?;

        let offers = map_flights(items, &query.origin, &query.destination);
        info!("AviationStack returned {} usable flights", offers.len());
        Ok(offers)
    }

    async fn search_airports(&self, _keyword: &str) -> ProviderResult<Vec<Airport>> {
        Err(ProviderError::Unsupported)
    }
}

/// Normalize tracking records. Pricing and duration are not available
/// from this feed, so those fields carry sentinels rather than being
/// omitted.
fn map_flights(items: &[Value], origin: &str, destination: &str) -> Vec<FlightOffer> {
    items
        .iter()
        .take(RESULT_LIMIT)
        .filter_map(|item| match map_single_flight(item, origin, destination) {
            Some(offer) => Some(offer),
            None => {
                warn!("skipping malformed AviationStack record: {item}");
                None
            }
        })
        .collect()
}

fn map_single_flight(item: &Value, origin: &str, destination: &str) -> Option<FlightOffer> {
    let flight = item.get("flight")?.as_object()?;
    let departure = item.get("departure")?.as_object()?;
    let arrival = item.get("arrival")?.as_object()?;

    let flight_iata = flight.get("iata").and_then(Value::as_str)?;
    let flight_date = item
        .get("flight_date")
        .and_then(Value::as_str)
        .unwrap_or_default();

    Some(FlightOffer {
        id: format!("{flight_date}_{flight_iata}"),
        flight_number: flight_iata.to_string(),
        origin: departure
            .get("iata")
            .and_then(Value::as_str)
            .unwrap_or(origin)
            .to_string(),
        destination: arrival
            .get("iata")
            .and_then(Value::as_str)
            .unwrap_or(destination)
            .to_string(),
        departure_time: departure
            .get("scheduled")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        arrival_time: arrival
            .get("scheduled")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        duration: FIELD_UNAVAILABLE.to_string(),
        stops: 0,
        price: 0.0,
        currency: FIELD_UNAVAILABLE.to_string(),
        airline: item
            .get("airline")
            .and_then(|a| a.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("Unknown Airline")
            .to_string(),
        status: item
            .get("flight_status")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        source: OfferSource::Live,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_maps_tracking_record_with_sentinels() {
        let items = vec![json!({
            "flight_date": "2026-09-01",
            "flight_status": "scheduled",
            "flight": {"iata": "DL42"},
            "departure": {"iata": "JFK", "scheduled": "2026-09-01T09:00:00+00:00"},
            "arrival": {"iata": "LHR", "scheduled": "2026-09-01T21:00:00+00:00"},
            "airline": {"name": "Delta Air Lines"}
        })];
        let offers = map_flights(&items, "JFK", "LHR");
        assert_eq!(offers.len(), 1);
        let offer = &offers[0];
        assert_eq!(offer.id, "2026-09-01_DL42");
        assert_eq!(offer.duration, FIELD_UNAVAILABLE);
        assert_eq!(offer.price, 0.0);
        assert_eq!(offer.airline, "Delta Air Lines");
    }

    #[test]
    fn test_record_without_flight_block_is_skipped() {
        let items = vec![
            json!({"departure": {}, "arrival": {}}),
            json!({
                "flight": {"iata": "UA9"},
                "departure": {"iata": "SFO", "scheduled": "2026-09-01T07:00:00+00:00"},
                "arrival": {"iata": "ORD", "scheduled": "2026-09-01T13:00:00+00:00"}
            }),
        ];
        let offers = map_flights(&items, "SFO", "ORD");
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].flight_number, "UA9");
        assert_eq!(offers[0].airline, "Unknown Airline");
    }
}
