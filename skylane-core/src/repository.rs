use async_trait::async_trait;
use chrono::NaiveDate;

use crate::flight::Flight;
use crate::CoreResult;

/// Local flight catalog used as the last search fallback when route
/// parameters are incomplete: substring match on departure/arrival names
/// plus an exact-date match when a date is present.
#[async_trait]
pub trait FlightCatalog: Send + Sync {
    async fn search_flights(
        &self,
        departure: Option<&str>,
        arrival: Option<&str>,
        date: Option<NaiveDate>,
    ) -> CoreResult<Vec<Flight>>;
}
