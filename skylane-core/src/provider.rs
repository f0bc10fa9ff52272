use async_trait::async_trait;
use chrono::NaiveDate;

use crate::offer::{Airport, FlightOffer};

/// Shared outcome set for provider calls. Everything here is terminal for
/// the call; the only automatic retry in the system is the single
/// refresh-credentials retry the Amadeus client performs on 401.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Missing required search parameters: {0}")]
    MissingParams(&'static str),
    #[error("No data available from provider")]
    NotFound,
    #[error("Provider rate limit exceeded")]
    RateLimited,
    #[error("Provider authentication failed")]
    Unauthorized,
    #[error("Operation not supported by this provider")]
    Unsupported,
    #[error("Provider request failed: {0}")]
    Transient(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// A route query with origin/destination already resolved to IATA codes.
#[derive(Debug, Clone)]
pub struct RouteQuery {
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub adults: u32,
}

/// One third-party flight/airport data API. A provider may support only
/// one of the two operations; the other returns `Unsupported`.
#[async_trait]
pub trait FlightProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search_flights(&self, query: &RouteQuery) -> ProviderResult<Vec<FlightOffer>>;

    async fn search_airports(&self, keyword: &str) -> ProviderResult<Vec<Airport>>;
}
