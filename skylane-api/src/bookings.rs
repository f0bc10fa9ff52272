use axum::{extract::State, http::StatusCode, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use skylane_store::BookingSummary;

use crate::error::AppError;
use crate::middleware::auth::Claims;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/bookings", post(create_booking).get(list_bookings))
}

#[derive(Debug, Deserialize)]
struct CreateBookingRequest {
    flight_id: Uuid,
}

#[derive(Debug, Serialize)]
struct BookingResponse {
    id: Uuid,
    flight_id: Uuid,
    flight_number: String,
    payment_status: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

/// POST /api/bookings
///
/// Only approved accounts may book; anything else is a permission
/// failure, deliberately distinct from input validation.
async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let user_id = claims
        .user_id()
        .map_err(|_| AppError::AuthenticationError("Invalid token subject".to_string()))?;
    let user = state.users.get(user_id).await?;

    if !user.is_approved() {
        return Err(AppError::AuthorizationError(
            "Account is pending approval. You cannot make bookings until approved.".to_string(),
        ));
    }

    let flight = state.flights.get(req.flight_id).await?;
    if !flight.availability {
        return Err(AppError::ValidationError(format!(
            "Flight {} is not available for booking",
            flight.flight_number
        )));
    }

    let booking = state.bookings.create(user.id, flight.id).await?;
    tracing::info!("booking {} created for user {}", booking.id, user.username);

    Ok((
        StatusCode::CREATED,
        Json(BookingResponse {
            id: booking.id,
            flight_id: flight.id,
            flight_number: flight.flight_number,
            payment_status: booking.payment_status.to_string(),
            created_at: booking.created_at,
        }),
    ))
}

/// GET /api/bookings
async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<BookingSummary>>, AppError> {
    let user_id = claims
        .user_id()
        .map_err(|_| AppError::AuthenticationError("Invalid token subject".to_string()))?;
    let bookings = state.bookings.list_for_user(user_id).await?;
    Ok(Json(bookings))
}
