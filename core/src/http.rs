//! HTTP transport types.
//!
//! # Design
//! Requests and responses are described as plain data. `Client` builds an
//! `HttpRequest`, hands it to a `Transport`, and interprets the returned
//! `HttpResponse`, so the marshaling logic can be tested without a network.
//! Response bodies are read in full; there is no streaming.

use std::borrow::Cow;
use std::time::Duration;

/// An outbound request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
    /// Bound for the whole call: connect, send and reading the body.
    pub timeout: Duration,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A response described as plain data, with the full body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Status code followed by its canonical reason, e.g. `404 Not Found`.
    pub fn status_line(&self) -> String {
        let reason = ureq::http::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason());
        match reason {
            Some(reason) => format!("{} {reason}", self.status),
            None => self.status.to_string(),
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: b"{}".to_vec(),
        }
    }

    #[test]
    fn status_line_includes_reason() {
        assert_eq!(response(404).status_line(), "404 Not Found");
        assert_eq!(response(200).status_line(), "200 OK");
    }

    #[test]
    fn status_line_without_known_reason() {
        assert_eq!(response(599).status_line(), "599");
    }

    #[test]
    fn success_range_is_half_open() {
        assert!(response(200).is_success());
        assert!(response(299).is_success());
        assert!(!response(300).is_success());
        assert!(!response(199).is_success());
    }

    #[test]
    fn header_lookup_ignores_case() {
        assert_eq!(response(200).header("content-type"), Some("application/json"));
        assert_eq!(response(200).header("x-missing"), None);
    }
}
