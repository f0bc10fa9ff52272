use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use skylane_core::offer::{Airport, FlightOffer};
use skylane_core::provider::ProviderError;
use skylane_core::search::FlightSearchQuery;

use crate::error::AppError;
use crate::state::AppState;

/// Routes that need no authentication.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/flights/search", get(search_flights))
}

/// Routes behind the authenticated-user middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/flights", get(list_flights))
        .route("/flights/status/{flight_number}", get(flight_status))
        .route("/airports/search", get(search_airports))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    departure: Option<String>,
    arrival: Option<String>,
    date: Option<String>,
    return_date: Option<String>,
    adults: Option<u32>,
    #[serde(default)]
    use_mock: bool,
}

/// GET /api/flights/search?departure=&arrival=&date=
///
/// Resolves through the fallback chain: live provider, synthetic offers,
/// local catalog. Upstream failures never surface here; the response is
/// always an offer list.
async fn search_flights(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<FlightOffer>>, AppError> {
    let query = FlightSearchQuery {
        departure: params.departure,
        arrival: params.arrival,
        date: parse_date(params.date.as_deref())?,
        return_date: parse_date(params.return_date.as_deref())?,
        adults: params.adults.unwrap_or(1),
        use_mock: params.use_mock || state.force_mock_search,
    };

    let offers = state.search.search(&query).await?;
    Ok(Json(offers))
}

/// GET /api/flights
async fn list_flights(State(state): State<AppState>) -> Result<Json<Vec<FlightOffer>>, AppError> {
    let flights = state.flights.list().await?;
    Ok(Json(flights.iter().map(|f| f.to_offer()).collect()))
}

/// GET /api/flights/status/{flight_number}
async fn flight_status(
    State(state): State<AppState>,
    Path(flight_number): Path<String>,
) -> Result<Json<FlightOffer>, AppError> {
    let flight = state.flights.find_by_number(&flight_number).await?;
    Ok(Json(flight.to_offer()))
}

#[derive(Debug, Deserialize)]
struct AirportSearchParams {
    keyword: Option<String>,
    country: Option<String>,
}

/// GET /api/airports/search?keyword=
async fn search_airports(
    State(state): State<AppState>,
    Query(params): Query<AirportSearchParams>,
) -> Result<Json<Vec<Airport>>, AppError> {
    let keyword = params
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| AppError::ValidationError("Keyword is required".to_string()))?;

    let Some(airlabs) = &state.airports else {
        return Err(AppError::UpstreamError(
            "airport search provider is not configured".to_string(),
        ));
    };

    let airports = airlabs
        .search_airports_in(keyword, params.country.as_deref())
        .await
        .map_err(provider_error)?;

    if airports.is_empty() {
        return Err(AppError::NotFoundError("No airports found".to_string()));
    }
    Ok(Json(airports))
}

fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match raw {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(|_| AppError::ValidationError("Invalid date format".to_string())),
    }
}

fn provider_error(err: ProviderError) -> AppError {
    match err {
        ProviderError::NotFound => AppError::NotFoundError("No airports found".to_string()),
        ProviderError::MissingParams(what) => {
            AppError::ValidationError(format!("Missing parameters: {what}"))
        }
        other => AppError::UpstreamError(other.to_string()),
    }
}
