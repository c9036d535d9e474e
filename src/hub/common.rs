//! Request helpers shared by the handlers

use axum::http::{header, HeaderMap, Uri};

/// Query marker the go tool sends when discovering import paths
pub const GO_GET_PARAM: &str = "go-get";

/// Whether the query pairs carry `go-get=1` (first occurrence wins)
pub fn is_go_get(params: &[(String, String)]) -> bool {
    params
        .iter()
        .find(|(key, _)| key == GO_GET_PARAM)
        .map_or(false, |(_, value)| value == "1")
}

/// Hostname the request was addressed to, port stripped
///
/// Taken from the `Host` header, or the URI authority for HTTP/2.
pub fn request_host(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let authority = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))?;

    let host = strip_port(authority.trim());
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

/// `example.org:8080` → `example.org`, `[::1]:80` → `::1`
pub fn strip_port(authority: &str) -> &str {
    if let Some(rest) = authority.strip_prefix('[') {
        return rest.split_once(']').map_or(authority, |(host, _)| host);
    }
    match authority.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') && port.bytes().all(|b| b.is_ascii_digit()) => {
            host
        }
        _ => authority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn pairs(query: &[(&str, &str)]) -> Vec<(String, String)> {
        query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_is_go_get() {
        assert!(is_go_get(&pairs(&[("go-get", "1")])));
        assert!(is_go_get(&pairs(&[("x", "y"), ("go-get", "1")])));
        assert!(!is_go_get(&pairs(&[("go-get", "0")])));
        assert!(!is_go_get(&pairs(&[("go-get", "1 ")])));
        assert!(!is_go_get(&pairs(&[("go-get", "2"), ("go-get", "1")])));
        assert!(!is_go_get(&[]));
    }

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("example.org:8080"), "example.org");
        assert_eq!(strip_port("example.org"), "example.org");
        assert_eq!(strip_port("[::1]:80"), "::1");
        assert_eq!(strip_port("[::1]"), "::1");
        assert_eq!(strip_port("::1"), "::1");
        assert_eq!(strip_port("example.org:"), "example.org");
    }

    #[test]
    fn test_request_host() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("Example.org:443"));
        let uri: Uri = "/foo".parse().unwrap();
        assert_eq!(request_host(&headers, &uri), Some("Example.org".to_string()));

        let uri: Uri = "https://example.net/foo".parse().unwrap();
        assert_eq!(request_host(&HeaderMap::new(), &uri), Some("example.net".to_string()));

        let uri: Uri = "/foo".parse().unwrap();
        assert_eq!(request_host(&HeaderMap::new(), &uri), None);
    }
}
