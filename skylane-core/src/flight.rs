use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::offer::{FlightOffer, OfferSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlightStatus {
    #[serde(rename = "on-time")]
    OnTime,
    #[serde(rename = "delayed")]
    Delayed,
}

impl FlightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::OnTime => "on-time",
            FlightStatus::Delayed => "delayed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "on-time" => Some(FlightStatus::OnTime),
            "delayed" => Some(FlightStatus::Delayed),
            _ => None,
        }
    }
}

impl std::fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A flight row from the local catalog. Created by admins or seed data,
/// read-heavy, mutated only through admin status updates.
#[derive(Debug, Clone, Serialize)]
pub struct Flight {
    pub id: Uuid,
    pub flight_number: String,
    pub departure: String,
    pub arrival: String,
    pub departure_at: DateTime<Utc>,
    pub price: f64,
    pub availability: bool,
    pub status: FlightStatus,
}

impl Flight {
    /// Airline code by convention: the first two characters of the flight
    /// number (e.g. "BA" from "BA117").
    pub fn airline_code(&self) -> &str {
        if self.flight_number.len() >= 2 {
            &self.flight_number[..2]
        } else {
            "UNK"
        }
    }

    /// Present a catalog flight in the normalized offer shape. The catalog
    /// stores no arrival time or duration, so an 8-hour leg is assumed.
    pub fn to_offer(&self) -> FlightOffer {
        let arrival_at = self.departure_at + Duration::hours(8);
        FlightOffer {
            id: self.id.to_string(),
            flight_number: self.flight_number.clone(),
            origin: self.departure.clone(),
            destination: self.arrival.clone(),
            departure_time: self.departure_at.to_rfc3339(),
            arrival_time: arrival_at.to_rfc3339(),
            duration: "PT8H".to_string(),
            stops: 0,
            price: self.price,
            currency: "USD".to_string(),
            airline: self.airline_code().to_string(),
            status: self.status.as_str().to_string(),
            source: OfferSource::Database,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_catalog_flight_normalization() {
        let flight = Flight {
            id: Uuid::new_v4(),
            flight_number: "BA117".into(),
            departure: "London".into(),
            arrival: "New York".into(),
            departure_at: Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap(),
            price: 540.0,
            availability: true,
            status: FlightStatus::OnTime,
        };
        let offer = flight.to_offer();
        assert_eq!(offer.airline, "BA");
        assert_eq!(offer.duration, "PT8H");
        assert_eq!(offer.source, OfferSource::Database);
        assert_eq!(offer.status, "on-time");
        assert!(offer.arrival_time.starts_with("2026-09-01T18:00:00"));
    }
}
