//! Per-client token buckets for the question routes.
//!
//! Buckets are keyed by the socket peer address, so the router must be served
//! with `into_make_service_with_connect_info::<SocketAddr>()`. Requests over
//! the limit get `429 Too Many Requests`.

use axum::body::Body;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::PeerIpKeyExtractor,
};

/// Governor layer type shared by both route groups.
pub type QuestionGovernor = GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, Body>;

/// Sustained rate and burst allowance of one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub per_second: u64,
    pub burst: u32,
}

/// Anonymous listing and detail reads.
pub const READ_LIMIT: Limit = Limit {
    per_second: 2,
    burst: 100,
};

/// Question mutations and the edit form.
pub const WRITE_LIMIT: Limit = Limit {
    per_second: 1,
    burst: 10,
};

/// Limiter for the public read routes.
///
/// ```rust,ignore
/// let public = api::routes::public_routes().layer(rate_limit::layer());
/// ```
pub fn layer() -> QuestionGovernor {
    governor(READ_LIMIT)
}

/// Limiter for the authenticated routes. Applied outside the auth layer so
/// rejected tokens still consume the bucket.
pub fn secure_layer() -> QuestionGovernor {
    governor(WRITE_LIMIT)
}

fn governor(limit: Limit) -> QuestionGovernor {
    let config = GovernorConfigBuilder::default()
        .per_second(limit.per_second)
        .burst_size(limit.burst)
        .finish()
        .expect("rate limits are non-zero constants");

    GovernorLayer::new(Arc::new(config))
}
