//! HTTP utility functions for extracting request information.

use actix_web::HttpRequest;

/// Extract client IP address from request headers
///
/// Attempts to extract the real client IP from common proxy headers,
/// falling back to the connection remote address.
pub fn extract_client_ip(req: &HttpRequest) -> String {
    let ip_headers = ["X-Forwarded-For", "X-Real-IP", "CF-Connecting-IP"];

    for header_name in &ip_headers {
        if let Some(header_str) = header_value(req, header_name) {
            // X-Forwarded-For can contain multiple IPs, take the first one
            let ip = header_str.split(',').next().unwrap_or(&header_str).trim();
            if !ip.is_empty() {
                return ip.to_string();
            }
        }
    }

    req.connection_info()
        .peer_addr()
        .unwrap_or("unknown")
        .to_string()
}

/// Extract user agent from request headers
pub fn extract_user_agent(req: &HttpRequest) -> Option<String> {
    header_value(req, "User-Agent")
}

/// Header value as a string, if present and visible ASCII.
pub fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

/// Path and query exactly as the client sent them.
///
/// This is what a client signs, so it must not be normalised.
pub fn full_path(req: &HttpRequest) -> String {
    req.uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.path().to_string())
}

/// Route label for metrics. Uses the matched pattern when there is one so
/// that path parameters do not explode label cardinality.
pub fn extract_route_pattern(req: &HttpRequest) -> String {
    if let Some(pattern) = req.match_pattern() {
        return pattern;
    }

    let path = req.path();
    if path.starts_with('/') {
        path.to_string()
    } else {
        "/unknown".to_string()
    }
}
