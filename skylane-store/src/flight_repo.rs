use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use skylane_core::flight::{Flight, FlightStatus};
use skylane_core::repository::FlightCatalog;
use skylane_core::{CoreError, CoreResult};

#[derive(Debug, FromRow)]
struct FlightRow {
    id: Uuid,
    flight_number: String,
    departure: String,
    arrival: String,
    departure_at: DateTime<Utc>,
    price: f64,
    availability: bool,
    status: String,
}

impl TryFrom<FlightRow> for Flight {
    type Error = CoreError;

    fn try_from(row: FlightRow) -> Result<Self, Self::Error> {
        let status = FlightStatus::parse(&row.status).ok_or_else(|| {
            CoreError::Internal(format!("unknown flight status '{}'", row.status))
        })?;
        Ok(Flight {
            id: row.id,
            flight_number: row.flight_number,
            departure: row.departure,
            arrival: row.arrival,
            departure_at: row.departure_at,
            price: row.price,
            availability: row.availability,
            status,
        })
    }
}

const FLIGHT_COLUMNS: &str =
    "id, flight_number, departure, arrival, departure_at, price, availability, status";

#[derive(Clone)]
pub struct FlightRepo {
    pool: PgPool,
}

impl FlightRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        flight_number: &str,
        departure: &str,
        arrival: &str,
        departure_at: DateTime<Utc>,
        price: f64,
    ) -> CoreResult<Flight> {
        let row = sqlx::query_as::<_, FlightRow>(&format!(
            r#"
            INSERT INTO flights (id, flight_number, departure, arrival, departure_at, price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {FLIGHT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(flight_number)
        .bind(departure)
        .bind(arrival)
        .bind(departure_at)
        .bind(price)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                CoreError::Validation(format!("Flight {flight_number} already exists"))
            }
            other => db_err(other),
        })?;
        row.try_into()
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<Flight> {
        let row = sqlx::query_as::<_, FlightRow>(&format!(
            "SELECT {FLIGHT_COLUMNS} FROM flights WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or_else(|| CoreError::NotFound(format!("Flight {id} not found")))?;
        row.try_into()
    }

    pub async fn find_by_number(&self, flight_number: &str) -> CoreResult<Flight> {
        let row = sqlx::query_as::<_, FlightRow>(&format!(
            "SELECT {FLIGHT_COLUMNS} FROM flights WHERE flight_number = $1"
        ))
        .bind(flight_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or_else(|| CoreError::NotFound(format!("Flight {flight_number} not found")))?;
        row.try_into()
    }

    pub async fn list(&self) -> CoreResult<Vec<Flight>> {
        let rows = sqlx::query_as::<_, FlightRow>(&format!(
            "SELECT {FLIGHT_COLUMNS} FROM flights ORDER BY departure_at"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter().map(Flight::try_from).collect()
    }

    pub async fn update_status(&self, id: Uuid, status: FlightStatus) -> CoreResult<Flight> {
        let row = sqlx::query_as::<_, FlightRow>(&format!(
            "UPDATE flights SET status = $2 WHERE id = $1 RETURNING {FLIGHT_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or_else(|| CoreError::NotFound(format!("Flight {id} not found")))?;
        row.try_into()
    }
}

#[async_trait]
impl FlightCatalog for FlightRepo {
    async fn search_flights(
        &self,
        departure: Option<&str>,
        arrival: Option<&str>,
        date: Option<NaiveDate>,
    ) -> CoreResult<Vec<Flight>> {
        let rows = sqlx::query_as::<_, FlightRow>(&format!(
            r#"
            SELECT {FLIGHT_COLUMNS} FROM flights
            WHERE ($1::text IS NULL OR departure ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR arrival ILIKE '%' || $2 || '%')
              AND ($3::date IS NULL OR departure_at::date = $3)
            ORDER BY departure_at
            "#
        ))
        .bind(departure)
        .bind(arrival)
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter().map(Flight::try_from).collect()
    }
}

fn db_err(err: sqlx::Error) -> CoreError {
    CoreError::Internal(format!("database error: {err}"))
}
