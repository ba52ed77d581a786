use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use jetway_core::repository::FlightRepository;
use jetway_core::{Flight, Seat, StoreResult};

use crate::database::{backend, unique_as};

pub struct PostgresFlightRepository {
    pool: PgPool,
}

impl PostgresFlightRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const FLIGHT_COLUMNS: &str = "id, flight_number, origin, destination, departure_time, arrival_time, \
     price, aircraft, gate, total_seats, available_seats, seat_map, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct FlightRow {
    id: Uuid,
    flight_number: String,
    origin: String,
    destination: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    price: f64,
    aircraft: String,
    gate: String,
    total_seats: i32,
    available_seats: i32,
    seat_map: Json<Vec<Seat>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<FlightRow> for Flight {
    fn from(row: FlightRow) -> Self {
        Flight {
            id: row.id,
            flight_number: row.flight_number,
            origin: row.origin,
            destination: row.destination,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            price: row.price,
            aircraft: row.aircraft,
            gate: row.gate,
            total_seats: row.total_seats,
            available_seats: row.available_seats,
            seat_map: row.seat_map.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl FlightRepository for PostgresFlightRepository {
    async fn insert_flight(&self, flight: &Flight) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO flights (id, flight_number, origin, destination, departure_time, arrival_time,
                                 price, aircraft, gate, total_seats, available_seats, seat_map, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(flight.id)
        .bind(&flight.flight_number)
        .bind(&flight.origin)
        .bind(&flight.destination)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(flight.price)
        .bind(&flight.aircraft)
        .bind(&flight.gate)
        .bind(flight.total_seats)
        .bind(flight.available_seats)
        .bind(Json(&flight.seat_map))
        .bind(flight.created_at)
        .bind(flight.updated_at)
        .execute(&self.pool)
        .await
        .map_err(unique_as(&flight.flight_number))?;

        Ok(())
    }

    async fn get_flight(&self, id: Uuid) -> StoreResult<Option<Flight>> {
        let row = sqlx::query_as::<_, FlightRow>(&format!(
            "SELECT {} FROM flights WHERE id = $1",
            FLIGHT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(Flight::from))
    }

    async fn find_by_number(&self, flight_number: &str) -> StoreResult<Option<Flight>> {
        let row = sqlx::query_as::<_, FlightRow>(&format!(
            "SELECT {} FROM flights WHERE flight_number = $1",
            FLIGHT_COLUMNS
        ))
        .bind(flight_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(Flight::from))
    }

    async fn list_flights(&self) -> StoreResult<Vec<Flight>> {
        let rows = sqlx::query_as::<_, FlightRow>(&format!(
            "SELECT {} FROM flights ORDER BY departure_time ASC",
            FLIGHT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.into_iter().map(Flight::from).collect())
    }

    async fn update_flight(&self, flight: &Flight) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE flights
            SET flight_number = $2, origin = $3, destination = $4, departure_time = $5,
                arrival_time = $6, price = $7, aircraft = $8, gate = $9, total_seats = $10,
                seat_map = $11, updated_at = $12
            WHERE id = $1
            "#,
        )
        .bind(flight.id)
        .bind(&flight.flight_number)
        .bind(&flight.origin)
        .bind(&flight.destination)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(flight.price)
        .bind(&flight.aircraft)
        .bind(&flight.gate)
        .bind(flight.total_seats)
        .bind(Json(&flight.seat_map))
        .bind(flight.updated_at)
        .execute(&self.pool)
        .await
        .map_err(unique_as(&flight.flight_number))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_flight(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM flights WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        Ok(result.rows_affected() > 0)
    }

    async fn take_seats(&self, id: Uuid, seats: i32) -> StoreResult<Option<i32>> {
        // Compare-and-set: concurrent writers can never push the counter below zero.
        sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE flights
            SET available_seats = available_seats - $2, updated_at = NOW()
            WHERE id = $1 AND available_seats >= $2
            RETURNING available_seats
            "#,
        )
        .bind(id)
        .bind(seats)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)
    }

    async fn return_seats(&self, id: Uuid, seats: i32) -> StoreResult<Option<i32>> {
        sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE flights
            SET available_seats = available_seats + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING available_seats
            "#,
        )
        .bind(id)
        .bind(seats)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)
    }

    async fn set_available_seats(&self, id: Uuid, available: i32) -> StoreResult<()> {
        sqlx::query("UPDATE flights SET available_seats = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(available)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        Ok(())
    }
}
