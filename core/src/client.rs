//! Request submission.
//!
//! # Design
//! `Client` owns the transport and the default timeout and holds no
//! per-request state, so one client serves any number of `Req`s from any
//! thread. Submission is split into `build_request` (validation and
//! marshaling, no I/O), the transport round trip, and `parse_response`
//! (status check and decoding).
//!
//! A process-wide default client backs `Req::submit`. It can be replaced,
//! usually once at startup or from tests.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use once_cell::sync::Lazy;

use crate::body::encode_query;
use crate::error::{HttpError, SyntaxError, WebError};
use crate::http::{HttpRequest, HttpResponse};
use crate::req::Req;
use crate::transport::{Incoming, Transport, UreqTransport};

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

static DEFAULT_CLIENT: Lazy<ArcSwap<Client>> =
    Lazy::new(|| ArcSwap::from_pointee(Client::new()));

/// The client used by `Req::submit`.
pub fn default_client() -> Arc<Client> {
    DEFAULT_CLIENT.load_full()
}

pub fn set_default_client(client: Client) {
    DEFAULT_CLIENT.store(Arc::new(client));
}

/// Change the timeout of the default client, keeping its transport.
pub fn set_default_timeout(timeout: Duration) {
    DEFAULT_CLIENT.rcu(|current| Client {
        transport: Arc::clone(&current.transport),
        timeout,
    });
}

#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl Client {
    pub fn new() -> Self {
        Self::with_transport(UreqTransport::new())
    }

    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send `req` and decode the response into `req.data`.
    ///
    /// Descriptor mistakes return a `SyntaxError` before anything is sent.
    /// Transport failures come back unchanged. A response outside 200-299
    /// is an `HttpError`. `req.resp` is set as soon as the response head
    /// arrives, so status and headers can be inspected on every outcome,
    /// including a body that fails to read.
    pub fn submit(&self, req: &mut Req<'_>) -> Result<(), WebError> {
        let request = self.build_request(req)?;
        log::debug!("{} {}", request.method, request.url);

        let Incoming { head, mut body } = match self.transport.execute(&request) {
            Ok(incoming) => incoming,
            Err(e) => {
                req.resp = None;
                return Err(WebError::Transport(e));
            }
        };
        log::debug!("{} {} -> {}", request.method, request.url, head.status);

        let response = req.resp.insert(head);
        let read = body.read_to_end(&mut response.body);
        if let Err(e) = read {
            if response.is_success() {
                return Err(WebError::Transport(Box::new(e)));
            }
            log::warn!(
                "{} {}: reading body of {} response failed: {e}",
                request.method,
                request.url,
                response.status
            );
        }

        Self::interpret(req)
    }

    /// Validate and normalize `req`, and marshal it into an `HttpRequest`.
    ///
    /// Rewrites `req.method`, `req.url` and `req.headers` in place.
    pub fn build_request(&self, req: &mut Req<'_>) -> Result<HttpRequest, WebError> {
        if req.method.is_empty() {
            req.method = "GET".to_string();
        }
        if ureq::http::Method::from_bytes(req.method.as_bytes()).is_err() {
            return Err(SyntaxError::new(format!("invalid method {:?}", req.method)).into());
        }
        if req.url.contains('?') {
            return Err(SyntaxError::new("URL contains '?' (use query instead)").into());
        }
        if let Err(e) = url::Url::parse(&req.url) {
            return Err(SyntaxError::new(format!("invalid URL {:?}: {e}", req.url)).into());
        }
        req.data.check()?;

        let query = encode_query(&req.query);
        if !query.is_empty() {
            req.url = format!("{}?{query}", req.url);
        }

        let encoded = req.body.encode()?;
        if let Some(content_type) = encoded.content_type {
            req.headers
                .insert("Content-Type".to_string(), content_type.to_string());
        }
        req.headers
            .insert("Content-Length".to_string(), encoded.text.len().to_string());

        Ok(HttpRequest {
            method: req.method.clone(),
            url: req.url.clone(),
            headers: req
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            body: encoded.text,
            timeout: req.timeout.unwrap_or(self.timeout),
        })
    }

    /// Classify `response` by status and decode its body into `req.data`.
    ///
    /// Stores the response on `req.resp`. An empty body leaves the
    /// destination untouched.
    pub fn parse_response(&self, req: &mut Req<'_>, response: HttpResponse) -> Result<(), WebError> {
        req.resp = Some(response);
        Self::interpret(req)
    }

    fn interpret(req: &mut Req<'_>) -> Result<(), WebError> {
        let Some(response) = req.resp.as_ref() else {
            return Ok(());
        };
        if !response.is_success() {
            return Err(HttpError {
                response: response.clone(),
            }
            .into());
        }
        if response.body.is_empty() {
            return Ok(());
        }
        req.data.decode(&response.body)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
