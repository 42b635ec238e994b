//! Axum HTTP surface for Courtside court reservations.
//!
//! Handlers are a thin shell around [`courtside_runtime::ReservationService`]:
//!
//! 1. **Extract** path segments, query and JSON body
//! 2. **Validate** ids and timestamps at the boundary
//! 3. **Call** the admission service
//! 4. **Map** the outcome to a status code through [`AppError`]
//!
//! # Example
//!
//! ```ignore
//! use courtside_web::{AppState, build_router};
//!
//! let app = build_router(AppState::new(service));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
pub mod time;

pub use error::AppError;
pub use middleware::{REQUEST_ID_HEADER, with_request_tracing};
pub use router::build_router;
pub use state::AppState;
pub use time::{TimestampError, parse_timestamp};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
