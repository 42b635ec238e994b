//! `PostgreSQL` reservation store for Courtside.
//!
//! This crate provides a PostgreSQL-based implementation of the
//! `ReservationStore` trait from `courtside-core`, built on sqlx:
//!
//! - Overlap lookup with the half-open predicate pushed into SQL
//! - Atomic cancellation through `UPDATE ... RETURNING`
//! - Connection pooling
//!
//! The `reservations` table is provisioned outside this crate.
//!
//! # Example
//!
//! ```no_run
//! use courtside_postgres::PostgresReservationStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresReservationStore::connect("postgres://localhost/courtside").await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod reservation_store;

pub use reservation_store::PostgresReservationStore;
