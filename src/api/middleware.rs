//! HTTP middleware

use std::time::Instant;

use axum::{body::Body, extract::MatchedPath, http::Request, middleware::Next, response::Response};
use tracing::debug;

use crate::infrastructure::observability::record_http_request;

/// Record request count and latency per matched route
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    // Matched route templates keep label cardinality bounded
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status().as_u16();

    debug!(
        method = %method,
        path = %path,
        status,
        duration_ms = duration.as_millis() as u64,
        "Request completed"
    );
    record_http_request(method.as_str(), &path, status, duration);

    response
}
