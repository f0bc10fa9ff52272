use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{error, warn};

use skylane_core::offer::{Airport, FlightOffer};
use skylane_core::provider::{FlightProvider, ProviderError, ProviderResult, RouteQuery};

use crate::RESULT_LIMIT;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_BASE_URL: &str = "https://airlabs.co/api/v9";

/// AirLabs airport directory. Flight search is not part of this API.
pub struct AirLabsClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AirLabsClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Airport search with an optional country filter.
    pub async fn search_airports_in(
        &self,
        keyword: &str,
        country: Option<&str>,
    ) -> ProviderResult<Vec<Airport>> {
        if keyword.trim().is_empty() {
            return Err(ProviderError::MissingParams("keyword"));
        }

        let mut params = vec![
            ("api_key", self.api_key.clone()),
            ("search", keyword.to_string()),
        ];
        if let Some(country) = country {
            params.push(("country", country.to_string()));
        }

        let url = format!("{}/airports", self.base_url);
        let response = self
            .http
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .query(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Transient(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::UNAUTHORIZED => {
                error!("AirLabs authentication failed, check API key");
                return Err(ProviderError::Unauthorized);
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(ProviderError::RateLimited),
            status => {
                error!("AirLabs request failed: HTTP {status}");
                return Err(ProviderError::Transient(format!("HTTP {status}")));
            }
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Transient(format!("invalid response body: {e}")))?;

        // AirLabs reports errors in a 200 body.
        if let Some(err) = body.get("error") {
            error!("AirLabs API error: {err}");
            return Err(ProviderError::Transient(err.to_string()));
        }

        let items = body
            .get("response")
            .and_then(Value::as_array)
            .ok_or(ProviderError::NotFound)?;
        Ok(map_airports(items))
    }
}

#[async_trait]
impl FlightProvider for AirLabsClient {
    fn name(&self) -> &'static str {
        "airlabs"
    }

    async fn search_flights(&self, _query: &RouteQuery) -> ProviderResult<Vec<FlightOffer>> {
        Err(ProviderError::Unsupported)
    }

    async fn search_airports(&self, keyword: &str) -> ProviderResult<Vec<Airport>> {
        self.search_airports_in(keyword, None).await
    }
}

/// Airports without an IATA code are dropped; everything else maps into
/// the shared shape, capped at `RESULT_LIMIT`.
fn map_airports(items: &[Value]) -> Vec<Airport> {
    items
        .iter()
        .filter_map(|item| {
            let iata_code = match item.get("iata_code").and_then(Value::as_str) {
                Some(code) if !code.is_empty() => code.to_string(),
                _ => {
                    warn!("skipping AirLabs airport without IATA code");
                    return None;
                }
            };
            Some(Airport {
                iata_code,
                name: item
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                city_name: item
                    .get("city")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                country_name: item
                    .get("country_name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })
        })
        .take(RESULT_LIMIT)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_airports_without_iata_are_filtered() {
        let items = vec![
            json!({"iata_code": "LHR", "name": "Heathrow", "city": "London", "country_name": "United Kingdom"}),
            json!({"name": "Some Field", "city": "Nowhere"}),
            json!({"iata_code": "", "name": "Empty Code"}),
        ];
        let airports = map_airports(&items);
        assert_eq!(airports.len(), 1);
        assert_eq!(airports[0].iata_code, "LHR");
        assert_eq!(airports[0].country_name, "United Kingdom");
    }

    #[test]
    fn test_airport_results_are_capped() {
        let items: Vec<Value> = (0..30)
            .map(|i| json!({"iata_code": format!("A{i:02}"), "name": "X"}))
            .collect();
        assert_eq!(map_airports(&items).len(), RESULT_LIMIT);
    }
}
