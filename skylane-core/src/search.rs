use chrono::NaiveDate;
use serde::Deserialize;

use crate::{CoreError, CoreResult};

fn default_adults() -> u32 {
    1
}

/// A flight search as submitted by a caller. Departure/arrival are free
/// text (city names or IATA codes); all route parameters are optional so
/// incomplete queries can fall through to the local catalog listing.
#[derive(Debug, Clone, Deserialize)]
pub struct FlightSearchQuery {
    pub departure: Option<String>,
    pub arrival: Option<String>,
    pub date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    #[serde(default = "default_adults")]
    pub adults: u32,
    #[serde(default)]
    pub use_mock: bool,
}

impl FlightSearchQuery {
    /// A query can go to a live provider or the mock generator only when
    /// the full route is present.
    pub fn has_full_route(&self) -> bool {
        self.departure.as_deref().is_some_and(|d| !d.trim().is_empty())
            && self.arrival.as_deref().is_some_and(|a| !a.trim().is_empty())
            && self.date.is_some()
    }

    /// Rejects departure dates strictly before `today`. Runs before any
    /// provider call is attempted.
    pub fn validate(&self, today: NaiveDate) -> CoreResult<()> {
        if let Some(date) = self.date {
            if date < today {
                return Err(CoreError::Validation(
                    "Departure date cannot be in the past".to_string(),
                ));
            }
        }
        if let (Some(date), Some(return_date)) = (self.date, self.return_date) {
            if return_date < date {
                return Err(CoreError::Validation(
                    "Return date cannot be before the departure date".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(date: Option<NaiveDate>) -> FlightSearchQuery {
        FlightSearchQuery {
            departure: Some("JFK".into()),
            arrival: Some("LHR".into()),
            date,
            return_date: None,
            adults: 1,
            use_mock: false,
        }
    }

    #[test]
    fn test_past_date_is_rejected() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let q = query(NaiveDate::from_ymd_opt(2026, 8, 5));
        assert!(matches!(q.validate(today), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_today_and_future_are_accepted() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        assert!(query(Some(today)).validate(today).is_ok());
        assert!(query(NaiveDate::from_ymd_opt(2026, 9, 1)).validate(today).is_ok());
        // Missing date is not a validation failure; it routes to the catalog.
        assert!(query(None).validate(today).is_ok());
    }

    #[test]
    fn test_return_before_departure_is_rejected() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let mut q = query(NaiveDate::from_ymd_opt(2026, 9, 10));
        q.return_date = NaiveDate::from_ymd_opt(2026, 9, 1);
        assert!(matches!(q.validate(today), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_full_route_detection() {
        assert!(query(NaiveDate::from_ymd_opt(2026, 9, 1)).has_full_route());
        assert!(!query(None).has_full_route());
        let mut q = query(NaiveDate::from_ymd_opt(2026, 9, 1));
        q.arrival = Some("  ".into());
        assert!(!q.has_full_route());
    }
}
