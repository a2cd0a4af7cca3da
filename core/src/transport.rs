//! Network execution of an `HttpRequest`.
//!
//! # Design
//! `Transport` is the seam tests substitute. The default `UreqTransport`
//! wraps a `ureq::Agent`, which is cheap to clone, safe to share between
//! threads and follows redirects before returning.
//!
//! A transport returns as soon as the response head arrives. The body is
//! handed back as a reader so the client can record status and headers
//! before reading it, and still has them if the read fails.

use std::io::{self, Read};

use crate::error::BoxError;
use crate::http::{HttpRequest, HttpResponse};

/// A response whose head has arrived and whose body is still to be read.
pub struct Incoming {
    /// Status and headers. `body` is empty.
    pub head: HttpResponse,
    pub body: Box<dyn Read>,
}

impl Incoming {
    /// Wrap a fully buffered response.
    pub fn buffered(mut response: HttpResponse) -> Self {
        let body = std::mem::take(&mut response.body);
        Self {
            head: response,
            body: Box::new(io::Cursor::new(body)),
        }
    }
}

impl std::fmt::Debug for Incoming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Incoming")
            .field("head", &self.head)
            .finish_non_exhaustive()
    }
}

/// Executes one request.
///
/// Any response that arrives, whatever its status, is returned as `Ok`.
/// `Err` is reserved for transport-level failures before the head arrives;
/// failures while reading the body surface from `Incoming::body`.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<Incoming, BoxError>;
}

#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<Incoming, BoxError> {
        let mut builder = ureq::http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());
        for (name, value) in &request.headers {
            // ureq derives the length from the body it sends
            if name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }

        let timeout = Some(request.timeout);
        let result = if request.body.is_empty() {
            let req = builder.body(())?;
            let req = self.agent.configure_request(req).timeout_global(timeout).build();
            self.agent.run(req)
        } else {
            let req = builder.body(request.body.clone())?;
            let req = self.agent.configure_request(req).timeout_global(timeout).build();
            self.agent.run(req)
        };
        let response = result?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        // ureq caps body reads at 10 MB unless told otherwise
        let body = response
            .into_body()
            .into_with_config()
            .limit(u64::MAX)
            .reader();

        Ok(Incoming {
            head: HttpResponse {
                status,
                headers,
                body: Vec::new(),
            },
            body: Box::new(body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffered_splits_head_from_body() {
        let response = HttpResponse {
            status: 200,
            headers: vec![("X-Id".to_string(), "1".to_string())],
            body: b"payload".to_vec(),
        };
        let mut incoming = Incoming::buffered(response);
        assert!(incoming.head.body.is_empty());
        assert_eq!(incoming.head.header("x-id"), Some("1"));

        let mut body = Vec::new();
        incoming.body.read_to_end(&mut body).unwrap();
        assert_eq!(body, b"payload");
    }
}
