//! Request spans for the question API.
//!
//! Every request runs inside an `http_request` span. The span carries an
//! empty `actor_id` field that [`super::auth::layer`] fills once the bearer
//! token resolves, so log lines emitted by handlers and services for a
//! mutation name the user behind it.
//!
//! ```text
//! INFO http_request{method=PUT path=/questions/5 actor_id=1}: question_board::application::services::question_service: Question updated id=5 slug=how-to-sort-fast
//! INFO http_request{method=PUT path=/questions/5 actor_id=1}: tower_http::trace::on_response: finished processing request latency=12 ms status=200
//! ```

use axum::body::Body;
use axum::http::Request;
use tower_http::LatencyUnit;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tracing::{Level, Span};

/// Span constructor used by [`layer`].
pub type MakeRequestSpan = fn(&Request<Body>) -> Span;

/// Field name [`super::auth::layer`] records the authenticated user under.
pub const ACTOR_FIELD: &str = "actor_id";

/// Trace layer wrapping the whole router.
///
/// Responses are logged at `INFO` with latency in milliseconds. 5xx responses
/// are additionally reported at `ERROR`.
pub fn layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, MakeRequestSpan> {
    TraceLayer::new_for_http()
        .make_span_with(request_span as MakeRequestSpan)
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
        .on_failure(
            DefaultOnFailure::new()
                .level(Level::ERROR)
                .latency_unit(LatencyUnit::Millis),
        )
}

fn request_span(req: &Request<Body>) -> Span {
    tracing::info_span!(
        "http_request",
        method = %req.method(),
        path = req.uri().path(),
        actor_id = tracing::field::Empty,
    )
}

/// Attaches the authenticated user to the current request span.
pub fn record_actor(user_id: i64) {
    Span::current().record(ACTOR_FIELD, user_id);
}
