use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use skylane_core::flight::FlightStatus;
use skylane_core::user::{User, UserStatus};
use skylane_store::BookingStats;

use crate::error::AppError;
use crate::mailer::EmailJob;
use crate::state::AppState;

/// Admin console surface. The caller has already passed the admin JWT
/// middleware by the time these handlers run.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/pending", get(list_pending_users))
        .route("/users/{id}/approve", post(approve_user))
        .route("/users/{id}/reject", post(reject_user))
        .route("/flights", get(list_flights))
        .route("/flights", post(create_flight))
        .route("/flights/{id}/status", put(update_flight_status))
        .route("/booking-stats", get(booking_stats))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct AdminUserResponse {
    id: Uuid,
    username: String,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    status: String,
    is_staff: bool,
}

impl From<&User> for AdminUserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            status: user.status.to_string(),
            is_staff: user.is_staff,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateFlightRequest {
    flight_number: String,
    departure: String,
    arrival: String,
    departure_at: DateTime<Utc>,
    price: f64,
}

#[derive(Debug, Deserialize)]
struct UpdateFlightStatusRequest {
    status: String,
}

// ============================================================================
// User approval workflow
// ============================================================================

/// GET /api/admin/users/pending
async fn list_pending_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<AdminUserResponse>>, AppError> {
    let users = state.users.list_by_status(UserStatus::Pending).await?;
    Ok(Json(users.iter().map(AdminUserResponse::from).collect()))
}

/// POST /api/admin/users/{id}/approve
///
/// Idempotent: approving an already-approved user overwrites the same
/// status and still sends the notification.
async fn approve_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<AdminUserResponse>, AppError> {
    let user = state.users.set_status(user_id, UserStatus::Approved).await?;
    state.mailer.enqueue(EmailJob::Approved { user_id });
    tracing::info!("user {} approved", user.username);
    Ok(Json(AdminUserResponse::from(&user)))
}

/// POST /api/admin/users/{id}/reject
async fn reject_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<AdminUserResponse>, AppError> {
    let user = state.users.set_status(user_id, UserStatus::Rejected).await?;
    state.mailer.enqueue(EmailJob::Rejected { user_id });
    tracing::info!("user {} rejected", user.username);
    Ok(Json(AdminUserResponse::from(&user)))
}

// ============================================================================
// Flight management
// ============================================================================

/// GET /api/admin/flights
async fn list_flights(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let flights = state.flights.list().await?;
    Ok(Json(json!(flights)))
}

/// POST /api/admin/flights
async fn create_flight(
    State(state): State<AppState>,
    Json(req): Json<CreateFlightRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    if req.flight_number.trim().is_empty() {
        return Err(AppError::ValidationError(
            "flight_number is required".to_string(),
        ));
    }
    if req.price <= 0.0 {
        return Err(AppError::ValidationError(
            "price must be positive".to_string(),
        ));
    }

    let flight = state
        .flights
        .create(
            req.flight_number.trim(),
            &req.departure,
            &req.arrival,
            req.departure_at,
            req.price,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(json!(flight))))
}

/// PUT /api/admin/flights/{id}/status
async fn update_flight_status(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
    Json(req): Json<UpdateFlightStatusRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let status = FlightStatus::parse(&req.status).ok_or_else(|| {
        AppError::ValidationError("Invalid status; expected 'on-time' or 'delayed'".to_string())
    })?;
    let flight = state.flights.update_status(flight_id, status).await?;
    Ok(Json(json!(flight)))
}

// ============================================================================
// Stats
// ============================================================================

/// GET /api/admin/booking-stats
async fn booking_stats(State(state): State<AppState>) -> Result<Json<BookingStats>, AppError> {
    let stats = state.bookings.stats().await?;
    Ok(Json(stats))
}
