//! # Request Stamping Middleware
//!
//! Gives every request an id for log correlation.
//!
//! The id is taken from an incoming `X-Request-ID` header when a proxy already
//! set one, otherwise a UUID v4 is generated. It is stored in the request
//! extensions and echoed in the response headers.
//!
//! ```rust,ignore
//! use axum::extract::Extension;
//! use lib_web::middleware::RequestStamp;
//!
//! async fn handler(Extension(stamp): Extension<RequestStamp>) -> String {
//!     format!("Request ID: {}", stamp.id)
//! }
//! ```

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Longest forwarded request id that is trusted.
const MAX_FORWARDED_ID_LEN: usize = 128;

/// Request metadata for tracing.
#[derive(Clone, Debug)]
pub struct RequestStamp {
    pub id: String,
    pub received_at: DateTime<Utc>,
}

impl RequestStamp {
    fn from_headers(headers: &HeaderMap) -> Self {
        let forwarded = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty() && id.len() <= MAX_FORWARDED_ID_LEN);

        Self {
            id: forwarded.map_or_else(|| Uuid::new_v4().to_string(), str::to_string),
            received_at: lib_utils::now_utc(),
        }
    }
}

/// Stamp the request and echo the id as `X-Request-ID`.
pub async fn stamp_req(mut req: Request, next: Next) -> Response {
    let stamp = RequestStamp::from_headers(req.headers());
    req.extensions_mut().insert(stamp.clone());

    let mut res = next.run(req).await;

    if let Ok(header_value) = HeaderValue::from_str(&stamp.id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, header_value);
    }

    res
}
