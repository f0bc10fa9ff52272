use serde::{Deserialize, Serialize};

/// Sentinel for fields a provider cannot supply. Downstream consumers rely
/// on every key being present, so nothing is ever omitted.
pub const FIELD_UNAVAILABLE: &str = "N/A";

/// Where a search result came from. Mock and database results must be
/// distinguishable from live provider data by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferSource {
    Live,
    Mock,
    Database,
}

/// Normalized flight offer shared by every provider and fallback path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightOffer {
    pub id: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: String,
    pub arrival_time: String,
    /// ISO-8601 duration, or "N/A" when the provider has no timing data.
    pub duration: String,
    pub stops: u32,
    /// Major currency units. 0.0 when the provider has no pricing data.
    pub price: f64,
    pub currency: String,
    pub airline: String,
    pub status: String,
    pub source: OfferSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Airport {
    pub iata_code: String,
    pub name: String,
    pub city_name: String,
    pub country_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offer_serializes_camel_case() {
        let offer = FlightOffer {
            id: "mock_1".into(),
            flight_number: "BA1234".into(),
            origin: "London".into(),
            destination: "New York".into(),
            departure_time: "2026-09-01T08:00:00Z".into(),
            arrival_time: "2026-09-01T16:30:00Z".into(),
            duration: "PT8H30M".into(),
            stops: 0,
            price: 420.50,
            currency: "USD".into(),
            airline: "British Airways".into(),
            status: "scheduled".into(),
            source: OfferSource::Mock,
        };
        let json = serde_json::to_value(&offer).expect("serialize");
        assert_eq!(json["flightNumber"], "BA1234");
        assert_eq!(json["departureTime"], "2026-09-01T08:00:00Z");
        assert_eq!(json["source"], "mock");
    }
}
