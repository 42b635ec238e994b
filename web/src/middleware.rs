//! Request tracking and HTTP tracing.
//!
//! Every request gets an `x-request-id` (kept if the client sent one,
//! generated otherwise). The id is recorded on the request span and echoed
//! back in the response header.
//!
//! # Example
//!
//! ```
//! use axum::{Router, routing::get};
//! use courtside_web::middleware::with_request_tracing;
//!
//! let app: Router = with_request_tracing(Router::new().route("/health", get(|| async { "ok" })));
//! ```

use axum::{Router, extract::Request};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::Span;

/// Header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the span each request is traced in.
///
/// Fields: `request_id`, `method`, `uri`.
#[must_use]
pub fn make_request_span(request: &Request) -> Span {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "http_request",
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri(),
    )
}

/// Wrap `router` with request-id assignment, tracing and propagation.
///
/// Layer order (outermost first): set id, trace, propagate id to response.
#[must_use]
pub fn with_request_tracing<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(PropagateRequestIdLayer::x_request_id()),
    )
}
