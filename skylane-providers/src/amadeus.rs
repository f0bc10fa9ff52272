use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, warn};

use skylane_core::cache::TokenStore;
use skylane_core::iata;
use skylane_core::offer::{Airport, FlightOffer, OfferSource};
use skylane_core::provider::{FlightProvider, ProviderError, ProviderResult, RouteQuery};

use crate::token_cache::{AmadeusTokenCache, IssuedToken, OAuthTokenSource};
use crate::RESULT_LIMIT;

const TOKEN_TIMEOUT: Duration = Duration::from_secs(10);
const RESOURCE_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 1800;

#[derive(Debug, Clone)]
pub struct AmadeusConfig {
    pub api_key: String,
    pub api_secret: String,
    pub base_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_lifetime")]
    expires_in: u64,
}

fn default_lifetime() -> u64 {
    DEFAULT_TOKEN_LIFETIME_SECS
}

/// The client-credentials exchange against the Amadeus OAuth2 endpoint.
struct AmadeusOAuth {
    http: reqwest::Client,
    config: AmadeusConfig,
}

#[async_trait]
impl OAuthTokenSource for AmadeusOAuth {
    async fn exchange(&self) -> ProviderResult<IssuedToken> {
        let url = format!("{}/v1/security/oauth2/token", self.config.base_url);
        let response = self
            .http
            .post(&url)
            .timeout(TOKEN_TIMEOUT)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.api_key.as_str()),
                ("client_secret", self.config.api_secret.as_str()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            error!("Amadeus token exchange failed: HTTP {status}");
            return Err(match status {
                StatusCode::UNAUTHORIZED => ProviderError::Unauthorized,
                StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited,
                _ => ProviderError::Transient(format!("token exchange returned HTTP {status}")),
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transient(format!("invalid token response: {e}")))?;
        Ok(IssuedToken {
            access_token: token.access_token,
            expires_in: token.expires_in,
        })
    }
}

/// Amadeus flight-offers and location search, with OAuth token caching
/// and a single refresh-and-retry on 401.
pub struct AmadeusClient {
    http: reqwest::Client,
    base_url: String,
    tokens: AmadeusTokenCache,
}

impl AmadeusClient {
    pub fn new(config: AmadeusConfig, store: Arc<dyn TokenStore>) -> Self {
        let http = reqwest::Client::new();
        let oauth = Arc::new(AmadeusOAuth {
            http: http.clone(),
            config: config.clone(),
        });
        Self {
            http,
            base_url: config.base_url,
            tokens: AmadeusTokenCache::new(store, oauth),
        }
    }

    pub fn token_cache(&self) -> &AmadeusTokenCache {
        &self.tokens
    }

    /// One authenticated GET. A 401 invalidates the cached token and the
    /// request is retried exactly once with a fresh one; every other
    /// non-2xx outcome is terminal for the call.
    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> ProviderResult<Value> {
        let mut token = self.tokens.get_token().await?;

        for attempt in 0..2 {
            let response = self
                .http
                .get(url)
                .timeout(RESOURCE_TIMEOUT)
                .bearer_auth(&token)
                .query(query)
                .send()
                .await
                .map_err(transport_error)?;

            match response.status() {
                StatusCode::OK => {
                    return response
                        .json()
                        .await
                        .map_err(|e| ProviderError::Transient(format!("invalid response body: {e}")));
                }
                StatusCode::UNAUTHORIZED if attempt == 0 => {
                    warn!("Amadeus returned 401, refreshing token and retrying once");
                    self.tokens.invalidate().await;
                    token = self.tokens.get_token().await?;
                }
                StatusCode::UNAUTHORIZED => return Err(ProviderError::Unauthorized),
                StatusCode::NOT_FOUND => return Err(ProviderError::NotFound),
                StatusCode::TOO_MANY_REQUESTS => return Err(ProviderError::RateLimited),
                status => {
                    error!("Amadeus request to {url} failed: HTTP {status}");
                    return Err(ProviderError::Transient(format!("HTTP {status}")));
                }
            }
        }
        unreachable!("authenticated GET retries are bounded at one");
    }
}

#[async_trait]
impl FlightProvider for AmadeusClient {
    fn name(&self) -> &'static str {
        "amadeus"
    }

    async fn search_flights(&self, query: &RouteQuery) -> ProviderResult<Vec<FlightOffer>> {
        if query.origin.is_empty() || query.destination.is_empty() {
            return Err(ProviderError::MissingParams("origin and destination"));
        }

        let mut params = vec![
            ("originLocationCode", query.origin.clone()),
            ("destinationLocationCode", query.destination.clone()),
            ("departureDate", query.date.to_string()),
            ("adults", query.adults.max(1).to_string()),
            ("max", "20".to_string()),
        ];
        if let Some(return_date) = query.return_date {
            params.push(("returnDate", return_date.to_string()));
        }

        let url = format!("{}/v2/shopping/flight-offers", self.base_url);
        let body = self.get_json(&url, &params).await?;

        let offers = body
            .get("data")
            .and_then(Value::as_array)
            .ok_or(ProviderError::NotFound)?;
        Ok(map_flight_offers(offers))
    }

    async fn search_airports(&self, keyword: &str) -> ProviderResult<Vec<Airport>> {
        if keyword.trim().is_empty() {
            return Err(ProviderError::MissingParams("keyword"));
        }

        let params = [
            ("keyword", keyword.to_string()),
            ("subType", "AIRPORT,CITY".to_string()),
        ];
        let url = format!("{}/v1/reference-data/locations", self.base_url);
        let body = self.get_json(&url, &params).await?;

        let locations = body
            .get("data")
            .and_then(Value::as_array)
            .ok_or(ProviderError::NotFound)?;
        Ok(map_airports(locations))
    }
}

/// Map Amadeus flight offers into the normalized shape, capped at
/// `RESULT_LIMIT`. Offers missing required sub-fields are skipped
/// one-by-one; a bad record never fails the whole call.
fn map_flight_offers(offers: &[Value]) -> Vec<FlightOffer> {
    offers
        .iter()
        .take(RESULT_LIMIT)
        .filter_map(|offer| match map_single_offer(offer) {
            Some(mapped) => Some(mapped),
            None => {
                warn!("skipping malformed Amadeus offer: {offer}");
                None
            }
        })
        .collect()
}

fn map_single_offer(offer: &Value) -> Option<FlightOffer> {
    let itinerary = offer.get("itineraries")?.get(0)?;
    let segments = itinerary.get("segments")?.as_array()?;
    let segment = segments.first()?;

    let carrier = segment.get("carrierCode")?.as_str()?;
    let number = segment.get("number")?.as_str()?;
    let origin_code = segment.get("departure")?.get("iataCode")?.as_str()?;
    let destination_code = segment.get("arrival")?.get("iataCode")?.as_str()?;

    let price = offer
        .get("price")?
        .get("total")?
        .as_str()?
        .parse::<f64>()
        .ok()?;
    let currency = offer
        .get("price")
        .and_then(|p| p.get("currency"))
        .and_then(Value::as_str)
        .unwrap_or("USD");

    Some(FlightOffer {
        id: offer.get("id")?.as_str()?.to_string(),
        flight_number: format!("{carrier}{number}"),
        origin: iata::city_from_iata(origin_code).unwrap_or_else(|| origin_code.to_string()),
        destination: iata::city_from_iata(destination_code)
            .unwrap_or_else(|| destination_code.to_string()),
        departure_time: segment.get("departure")?.get("at")?.as_str()?.to_string(),
        arrival_time: segment.get("arrival")?.get("at")?.as_str()?.to_string(),
        duration: itinerary
            .get("duration")
            .and_then(Value::as_str)
            .unwrap_or(skylane_core::offer::FIELD_UNAVAILABLE)
            .to_string(),
        stops: (segments.len().saturating_sub(1)) as u32,
        price,
        currency: currency.to_string(),
        airline: carrier.to_string(),
        status: "scheduled".to_string(),
        source: OfferSource::Live,
    })
}

fn map_airports(locations: &[Value]) -> Vec<Airport> {
    locations
        .iter()
        .take(RESULT_LIMIT)
        .filter_map(|location| {
            let iata_code = location.get("iataCode")?.as_str()?.to_string();
            let address = location.get("address");
            Some(Airport {
                iata_code,
                name: location
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                city_name: address
                    .and_then(|a| a.get("cityName"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                country_name: address
                    .and_then(|a| a.get("countryName"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })
        })
        .collect()
}

fn transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Transient("request timed out".to_string())
    } else {
        ProviderError::Transient(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_offer() -> Value {
        json!({
            "id": "1",
            "itineraries": [{
                "duration": "PT7H25M",
                "segments": [{
                    "carrierCode": "BA",
                    "number": "117",
                    "departure": {"iataCode": "JFK", "at": "2026-09-01T08:00:00"},
                    "arrival": {"iataCode": "LHR", "at": "2026-09-01T20:25:00"}
                }]
            }],
            "price": {"total": "523.40", "currency": "USD"}
        })
    }

    #[test]
    fn test_maps_well_formed_offer() {
        let offers = vec![sample_offer()];
        let mapped = map_flight_offers(&offers);
        assert_eq!(mapped.len(), 1);
        let offer = &mapped[0];
        assert_eq!(offer.flight_number, "BA117");
        assert_eq!(offer.origin, "New York");
        assert_eq!(offer.destination, "London");
        assert_eq!(offer.stops, 0);
        assert_eq!(offer.price, 523.40);
        assert_eq!(offer.source, OfferSource::Live);
    }

    #[test]
    fn test_malformed_offer_is_skipped_not_fatal() {
        let offers = vec![
            json!({"id": "broken"}),
            sample_offer(),
            json!({"id": "2", "itineraries": [], "price": {"total": "10.00"}}),
        ];
        let mapped = map_flight_offers(&offers);
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped[0].flight_number, "BA117");
    }

    #[test]
    fn test_result_count_is_capped() {
        let offers: Vec<Value> = (0..25)
            .map(|i| {
                let mut offer = sample_offer();
                offer["id"] = json!(i.to_string());
                offer
            })
            .collect();
        assert_eq!(map_flight_offers(&offers).len(), RESULT_LIMIT);
    }

    #[test]
    fn test_maps_airport_locations() {
        let locations = vec![
            json!({
                "iataCode": "LHR",
                "name": "HEATHROW",
                "address": {"cityName": "LONDON", "countryName": "UNITED KINGDOM"}
            }),
            json!({"name": "no code, skipped"}),
        ];
        let airports = map_airports(&locations);
        assert_eq!(airports.len(), 1);
        assert_eq!(airports[0].iata_code, "LHR");
        assert_eq!(airports[0].city_name, "LONDON");
    }
}
