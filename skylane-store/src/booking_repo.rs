use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use skylane_core::booking::{plan_transition, Booking, PaymentStatus};
use skylane_core::{CoreError, CoreResult};

#[derive(Debug, FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    flight_id: Uuid,
    payment_status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = CoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let payment_status = PaymentStatus::parse(&row.payment_status).ok_or_else(|| {
            CoreError::Internal(format!("unknown payment status '{}'", row.payment_status))
        })?;
        Ok(Booking {
            id: row.id,
            user_id: row.user_id,
            flight_id: row.flight_id,
            payment_status,
            created_at: row.created_at,
        })
    }
}

/// Booking joined with its flight, for list views.
#[derive(Debug, Serialize, FromRow)]
pub struct BookingSummary {
    pub id: Uuid,
    pub flight_number: String,
    pub departure: String,
    pub arrival: String,
    pub departure_at: DateTime<Utc>,
    pub price: f64,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct BookingStats {
    pub total_bookings: i64,
    pub paid_bookings: i64,
    pub pending_bookings: i64,
    pub failed_bookings: i64,
    pub total_revenue: f64,
}

const BOOKING_COLUMNS: &str = "id, user_id, flight_id, payment_status, created_at";

#[derive(Clone)]
pub struct BookingRepo {
    pool: PgPool,
}

impl BookingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: Uuid, flight_id: Uuid) -> CoreResult<Booking> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            INSERT INTO bookings (id, user_id, flight_id)
            VALUES ($1, $2, $3)
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(flight_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        row.try_into()
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<Booking> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or_else(|| CoreError::NotFound(format!("Booking {id} not found")))?;
        row.try_into()
    }

    /// Fetch a booking only if it belongs to the given user.
    pub async fn get_for_user(&self, id: Uuid, user_id: Uuid) -> CoreResult<Booking> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or_else(|| CoreError::NotFound(format!("Booking {id} not found")))?;
        row.try_into()
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> CoreResult<Vec<BookingSummary>> {
        sqlx::query_as::<_, BookingSummary>(
            r#"
            SELECT b.id, f.flight_number, f.departure, f.arrival, f.departure_at,
                   f.price, b.payment_status, b.created_at
            FROM bookings b
            JOIN flights f ON f.id = b.flight_id
            WHERE b.user_id = $1
            ORDER BY b.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)
    }

    /// Drive the payment state machine. The write is conditional on the
    /// row still being `pending`, so two concurrent paths (confirm call
    /// and webhook) cannot move a terminal booking backwards.
    ///
    /// Returns the booking and whether this call applied the change;
    /// `false` means an idempotent replay found the target state already
    /// set.
    pub async fn transition_payment(
        &self,
        id: Uuid,
        target: PaymentStatus,
    ) -> CoreResult<(Booking, bool)> {
        let current = self.get(id).await?;

        match plan_transition(current.payment_status, target) {
            Ok(false) => Ok((current, false)),
            Ok(true) => {
                let result = sqlx::query(
                    "UPDATE bookings SET payment_status = $2 WHERE id = $1 AND payment_status = 'pending'",
                )
                .bind(id)
                .bind(target.as_str())
                .execute(&self.pool)
                .await
                .map_err(db_err)?;

                if result.rows_affected() == 0 {
                    // Lost a race with the other payment path; re-read to
                    // classify the outcome.
                    let now = self.get(id).await?;
                    if now.payment_status == target {
                        return Ok((now, false));
                    }
                    return Err(CoreError::Validation(format!(
                        "Booking {id} is already {}",
                        now.payment_status
                    )));
                }
                let updated = self.get(id).await?;
                Ok((updated, true))
            }
            Err(err) => Err(CoreError::Validation(err.to_string())),
        }
    }

    pub async fn stats(&self) -> CoreResult<BookingStats> {
        sqlx::query_as::<_, BookingStats>(
            r#"
            SELECT
                COUNT(*) AS total_bookings,
                COUNT(*) FILTER (WHERE b.payment_status = 'paid') AS paid_bookings,
                COUNT(*) FILTER (WHERE b.payment_status = 'pending') AS pending_bookings,
                COUNT(*) FILTER (WHERE b.payment_status = 'failed') AS failed_bookings,
                COALESCE(SUM(f.price) FILTER (WHERE b.payment_status = 'paid'), 0)::float8 AS total_revenue
            FROM bookings b
            JOIN flights f ON f.id = b.flight_id
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)
    }
}

fn db_err(err: sqlx::Error) -> CoreError {
    CoreError::Internal(format!("database error: {err}"))
}
