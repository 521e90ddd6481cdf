//! HTTP metrics middleware

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::infrastructure::observability::record_http_request;

/// Record request count and latency per matched route
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let route = matched_route(&request);

    let response = next.run(request).await;

    record_http_request(method.as_str(), &route, response.status().as_u16(), start.elapsed());

    response
}

/// Unmatched paths share one label to bound cardinality
fn matched_route(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_route_label() {
        let request = Request::builder()
            .uri("/random/123")
            .body(Body::empty())
            .unwrap();

        assert_eq!(matched_route(&request), "unmatched");
    }
}
