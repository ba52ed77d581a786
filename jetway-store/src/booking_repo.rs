use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use jetway_core::repository::BookingRepository;
use jetway_core::{Booking, BookingFilter, BookingStatus, PaymentStatus, StoreError, StoreResult};

use crate::database::{backend, unique_as};

pub struct PostgresBookingRepository {
    pool: PgPool,
}

impl PostgresBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const BOOKING_COLUMNS: &str = "id, flight_id, user_id, passenger_name, passenger_email, seats, seat_numbers, \
     contact_number, payment_reference, payment_status, status, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    flight_id: Uuid,
    user_id: Uuid,
    passenger_name: String,
    passenger_email: String,
    seats: i32,
    seat_numbers: Vec<String>,
    contact_number: Option<String>,
    payment_reference: String,
    payment_status: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status: BookingStatus = row.status.parse().map_err(|e: String| StoreError::Backend(e.into()))?;
        let payment_status: PaymentStatus = row
            .payment_status
            .parse()
            .map_err(|e: String| StoreError::Backend(e.into()))?;

        Ok(Booking {
            id: row.id,
            flight_id: row.flight_id,
            user_id: row.user_id,
            passenger_name: row.passenger_name,
            passenger_email: row.passenger_email,
            seats: row.seats,
            seat_numbers: row.seat_numbers,
            contact_number: row.contact_number,
            payment_reference: row.payment_reference,
            payment_status,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query(
            r#"
            INSERT INTO bookings (id, flight_id, user_id, passenger_name, passenger_email, seats, seat_numbers,
                                  contact_number, payment_reference, payment_status, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(booking.id)
        .bind(booking.flight_id)
        .bind(booking.user_id)
        .bind(&booking.passenger_name)
        .bind(&booking.passenger_email)
        .bind(booking.seats)
        .bind(&booking.seat_numbers)
        .bind(&booking.contact_number)
        .bind(&booking.payment_reference)
        .bind(booking.payment_status.as_str())
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        if booking.is_confirmed() {
            for code in &booking.seat_numbers {
                sqlx::query("INSERT INTO reserved_seats (flight_id, seat_code, booking_id) VALUES ($1, $2, $3)")
                    .bind(booking.flight_id)
                    .bind(code)
                    .bind(booking.id)
                    .execute(&mut *tx)
                    .await
                    .map_err(unique_as(code))?;
            }
        }

        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(Booking::try_from).transpose()
    }

    async fn find_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM bookings WHERE TRUE", BOOKING_COLUMNS));

        if let Some(flight_id) = filter.flight_id {
            query.push(" AND flight_id = ").push_bind(flight_id);
        }
        if let Some(user_id) = filter.user_id {
            query.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        query.push(" ORDER BY created_at DESC");

        let rows = query
            .build_query_as::<BookingRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        payment_status: PaymentStatus,
    ) -> StoreResult<Option<Booking>> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "UPDATE bookings SET status = $2, payment_status = $3, updated_at = NOW() WHERE id = $1 RETURNING {}",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(payment_status.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?;

        if row.is_some() && status == BookingStatus::Cancelled {
            sqlx::query("DELETE FROM reserved_seats WHERE booking_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(backend)?;
        }

        tx.commit().await.map_err(backend)?;
        row.map(Booking::try_from).transpose()
    }
}
