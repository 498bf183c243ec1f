//! # Request/Response Logging Middleware
//!
//! One `[REQUEST]` line when a request arrives and one `[RESPONSE]` line when
//! it completes, both carrying the request id set by
//! [`stamp_req`](super::stamp_req). Headers are logged at debug level with
//! credentials redacted.
//!
//! WebSocket upgrades complete with `101 Switching Protocols`; the connection
//! itself is logged by the WebSocket handler under `[WS]`.

use super::mw_req_stamp::RequestStamp;
use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Header names containing any of these are redacted.
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "x-api-key",
    "x-auth-token",
    "sec-websocket-key",
];

const REDACTED: &str = "***REDACTED***";

/// Header name/value pairs safe to log.
fn sanitized_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            if SENSITIVE_HEADERS.iter().any(|h| name_lower.contains(h)) {
                Some((name.to_string(), REDACTED.to_string()))
            } else {
                value.to_str().ok().map(|v| (name.to_string(), v.to_string()))
            }
        })
        .collect()
}

pub async fn log_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    let request_id = req
        .extensions()
        .get::<RequestStamp>()
        .map(|s| s.id.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        query = ?query,
        user_agent = ?user_agent,
        "[REQUEST] {} {}",
        method,
        path
    );
    debug!(
        request_id = %request_id,
        headers = ?sanitized_headers(req.headers()),
        "[REQUEST HEADERS]"
    );

    let response = next.run(req).await;

    let duration_ms = start.elapsed().as_millis() as u64;
    let status = response.status();
    let status_code = status.as_u16();

    if status.is_server_error() {
        error!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status_code,
            duration_ms,
            "[RESPONSE] {} {} -> {} [SERVER ERROR]",
            method,
            path,
            status_code
        );
    } else if status.is_client_error() {
        warn!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status_code,
            duration_ms,
            "[RESPONSE] {} {} -> {} [CLIENT ERROR]",
            method,
            path,
            status_code
        );
    } else {
        info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status_code,
            duration_ms,
            "[RESPONSE] {} {} -> {} ({}ms)",
            method,
            path,
            status_code,
            duration_ms
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_sensitive_headers_are_redacted() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer secret"));
        headers.insert("sec-websocket-key", HeaderValue::from_static("dGhlIHNhbXBsZQ=="));
        headers.insert("accept", HeaderValue::from_static("application/json"));

        let logged = sanitized_headers(&headers);

        assert!(logged.contains(&("authorization".to_string(), REDACTED.to_string())));
        assert!(logged.contains(&("sec-websocket-key".to_string(), REDACTED.to_string())));
        assert!(logged.contains(&("accept".to_string(), "application/json".to_string())));
    }
}
