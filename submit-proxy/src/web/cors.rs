//! Permissive CORS headers for the submit endpoint.
//!
//! The requesting origin is echoed back (or `*` when there is none) on every
//! response, errors included, so browser clients can read the outcome.

use axum::{
    extract::Request,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN,
        },
        HeaderMap, HeaderValue,
    },
    middleware::Next,
    response::Response,
};

pub const ALLOWED_METHODS: &str = "POST,OPTIONS";
pub const ALLOWED_HEADERS: &str = "content-type";

/// Build the three CORS headers for a request.
pub fn cors_headers(request_headers: &HeaderMap) -> HeaderMap {
    let origin = request_headers
        .get(ORIGIN)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*"));

    let mut headers = HeaderMap::with_capacity(3);
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers
}

/// Middleware attaching [`cors_headers`] to whatever the inner handler returns.
pub async fn with_cors(request: Request, next: Next) -> Response {
    let headers = cors_headers(request.headers());
    let mut response = next.run(request).await;
    response.headers_mut().extend(headers);
    response
}
