//! `PostgreSQL` implementation of [`ReservationStore`].

use chrono::{DateTime, Utc};
use courtside_core::{
    CourtId, Reservation, ReservationId, ReservationStatus, ReservationStore, StoreError,
    StoreFuture, TimeSlot,
};
use sqlx::PgPool;
use std::time::Instant;
use uuid::Uuid;

const COLUMNS: &str = "id, court_id, status, reserved_from, reserved_to, reserved_by, cancelled_by, created_at";

/// Raw `reservations` row.
#[derive(Debug, sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    court_id: String,
    status: String,
    reserved_from: DateTime<Utc>,
    reserved_to: DateTime<Utc>,
    reserved_by: String,
    cancelled_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = StoreError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ReservationId::from_uuid(row.id),
            court_id: CourtId::new(row.court_id),
            status: ReservationStatus::parse(&row.status)?,
            reserved_from: row.reserved_from,
            reserved_to: row.reserved_to,
            reserved_by: row.reserved_by,
            cancelled_by: row.cancelled_by,
            created_at: row.created_at,
        })
    }
}

fn database_error(e: &sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn decode_rows(rows: Vec<ReservationRow>) -> Result<Vec<Reservation>, StoreError> {
    rows.into_iter().map(Reservation::try_from).collect()
}

fn record_query(operation: &'static str, started: Instant) {
    metrics::histogram!("reservation_store_query_duration_seconds", "operation" => operation)
        .record(started.elapsed().as_secs_f64());
}

/// `PostgreSQL`-backed reservation store.
///
/// Expects a `reservations` table:
///
/// ```sql
/// CREATE TABLE reservations (
///     id            UUID PRIMARY KEY,
///     court_id      TEXT NOT NULL,
///     status        TEXT NOT NULL,
///     reserved_from TIMESTAMPTZ NOT NULL,
///     reserved_to   TIMESTAMPTZ NOT NULL,
///     reserved_by   TEXT NOT NULL,
///     cancelled_by  TEXT,
///     created_at    TIMESTAMPTZ NOT NULL
/// );
/// ```
#[derive(Clone, Debug)]
pub struct PostgresReservationStore {
    pool: PgPool,
}

impl PostgresReservationStore {
    /// Connect to `database_url` with default pool settings.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the connection fails.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| database_error(&e))?;
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl ReservationStore for PostgresReservationStore {
    fn create<'a>(&'a self, reservation: &'a Reservation) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let started = Instant::now();
            sqlx::query(
                r"
                INSERT INTO reservations (
                    id, court_id, status, reserved_from, reserved_to,
                    reserved_by, cancelled_by, created_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(reservation.id.as_uuid())
            .bind(reservation.court_id.as_str())
            .bind(reservation.status.as_str())
            .bind(reservation.reserved_from)
            .bind(reservation.reserved_to)
            .bind(&reservation.reserved_by)
            .bind(reservation.cancelled_by.as_deref())
            .bind(reservation.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(reservation_id = %reservation.id, error = %e, "Failed to insert reservation");
                database_error(&e)
            })?;
            record_query("create", started);

            tracing::debug!(
                reservation_id = %reservation.id,
                court_id = %reservation.court_id,
                "Reservation inserted"
            );
            Ok(())
        })
    }

    fn find_overlapping<'a>(
        &'a self,
        court_id: &'a CourtId,
        slot: &'a TimeSlot,
    ) -> StoreFuture<'a, Vec<Reservation>> {
        Box::pin(async move {
            let started = Instant::now();
            let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
                r"
                SELECT {COLUMNS}
                FROM reservations
                WHERE court_id = $1
                  AND status <> 'cancelled'
                  AND reserved_from < $3
                  AND reserved_to > $2
                ORDER BY reserved_from
                "
            ))
            .bind(court_id.as_str())
            .bind(slot.from())
            .bind(slot.to())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| database_error(&e))?;
            record_query("find_overlapping", started);

            decode_rows(rows)
        })
    }

    fn get_by_id(&self, id: ReservationId) -> StoreFuture<'_, Reservation> {
        Box::pin(async move {
            let started = Instant::now();
            let row: Option<ReservationRow> = sqlx::query_as(&format!(
                "SELECT {COLUMNS} FROM reservations WHERE id = $1"
            ))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| database_error(&e))?;
            record_query("get_by_id", started);

            row.ok_or(StoreError::NotFound(id))?.try_into()
        })
    }

    fn cancel<'a>(
        &'a self,
        id: ReservationId,
        cancelled_by: &'a str,
    ) -> StoreFuture<'a, Reservation> {
        Box::pin(async move {
            let started = Instant::now();
            let row: Option<ReservationRow> = sqlx::query_as(&format!(
                r"
                UPDATE reservations
                SET status = 'cancelled', cancelled_by = $2
                WHERE id = $1
                  AND status <> 'cancelled'
                RETURNING {COLUMNS}
                "
            ))
            .bind(id.as_uuid())
            .bind((!cancelled_by.is_empty()).then_some(cancelled_by))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| database_error(&e))?;
            record_query("cancel", started);

            if let Some(row) = row {
                return row.try_into();
            }

            // Nothing updated: either the id is unknown or another cancel won.
            let exists: Option<(String,)> =
                sqlx::query_as("SELECT status FROM reservations WHERE id = $1")
                    .bind(id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| database_error(&e))?;
            if exists.is_some() {
                tracing::debug!(reservation_id = %id, "Cancel found reservation already cancelled");
                Err(StoreError::AlreadyCancelled(id))
            } else {
                tracing::warn!(reservation_id = %id, "Cancel matched no reservation");
                Err(StoreError::NotFound(id))
            }
        })
    }

    fn list_by_court_and_range<'a>(
        &'a self,
        court_id: &'a CourtId,
        slot: &'a TimeSlot,
    ) -> StoreFuture<'a, Vec<Reservation>> {
        Box::pin(async move {
            let started = Instant::now();
            let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
                r"
                SELECT {COLUMNS}
                FROM reservations
                WHERE court_id = $1
                  AND reserved_from < $3
                  AND reserved_to > $2
                ORDER BY reserved_from
                "
            ))
            .bind(court_id.as_str())
            .bind(slot.from())
            .bind(slot.to())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| database_error(&e))?;
            record_query("list_by_court_and_range", started);

            decode_rows(rows)
        })
    }
}
