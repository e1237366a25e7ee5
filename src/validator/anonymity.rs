//! Anonymity classification from a control endpoint's echoed headers.

use crate::models::Anonymity;
use std::collections::HashMap;

const SUSPICIOUS_HEADERS: &[&str] = &[
    "via",
    "x-forwarded-for",
    "x-forwarded",
    "forwarded-for",
    "forwarded",
    "client-ip",
    "proxy-connection",
    "x-proxy-id",
    "x-real-ip",
];

/// Classify a proxy from the headers a control endpoint reports seeing,
/// and the proxy's own IP (the address a leak would reveal).
///
/// - `elite`: no suspicious header present.
/// - `anonymous`: a suspicious header is present, but it does not carry
///   the proxy's IP.
/// - `transparent`: the proxy's IP leaks through a header value.
pub fn classify(echoed_headers: &HashMap<String, String>, proxy_ip: &str) -> Anonymity {
    let mut suspicious_present = false;

    for (name, value) in echoed_headers {
        let lower_name = name.to_lowercase();
        if SUSPICIOUS_HEADERS.contains(&lower_name.as_str()) {
            suspicious_present = true;
            if value.contains(proxy_ip) {
                return Anonymity::Transparent;
            }
        }
    }

    if suspicious_present {
        Anonymity::Anonymous
    } else {
        Anonymity::Elite
    }
}

/// Special case for control endpoints that echo the caller's IP in the
/// response body instead of (or in addition to) headers.
pub fn classify_from_echo_body(
    echoed_headers: &HashMap<String, String>,
    body: &str,
    proxy_ip: &str,
) -> Anonymity {
    if body.contains(proxy_ip) {
        return Anonymity::Transparent;
    }
    classify(echoed_headers, proxy_ip)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elite_when_no_suspicious_headers() {
        let headers = HashMap::new();
        assert_eq!(classify(&headers, "203.0.113.9"), Anonymity::Elite);
    }

    #[test]
    fn test_anonymous_when_header_present_without_leak() {
        let mut headers = HashMap::new();
        headers.insert("Via".to_string(), "1.1 some-proxy".to_string());
        assert_eq!(classify(&headers, "203.0.113.9"), Anonymity::Anonymous);
    }

    #[test]
    fn test_transparent_when_proxy_ip_leaks_in_header() {
        let mut headers = HashMap::new();
        headers.insert("X-Forwarded-For".to_string(), "203.0.113.9".to_string());
        assert_eq!(classify(&headers, "203.0.113.9"), Anonymity::Transparent);
    }

    #[test]
    fn test_transparent_when_proxy_ip_leaks_in_body() {
        let headers = HashMap::new();
        let body = r#"{"origin":"203.0.113.9"}"#;
        assert_eq!(
            classify_from_echo_body(&headers, body, "203.0.113.9"),
            Anonymity::Transparent
        );
    }
}
