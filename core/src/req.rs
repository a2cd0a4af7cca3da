//! The request descriptor.

use std::collections::HashMap;
use std::time::Duration;

use crate::body::{Body, Query};
use crate::client::default_client;
use crate::data::Data;
use crate::error::WebError;
use crate::http::HttpResponse;

/// Request headers. Only one value per name, unlike the wire format.
pub type Headers = HashMap<String, String>;

/// A human-friendly description of one web request, closer to a pragmatic
/// curl invocation than to the HTTP specification.
///
/// The query string always goes in `query`, never in `url`; `submit`
/// URL-encodes it and rejects a `url` that already contains `?`. `body`
/// decides what is sent and `data` decides where the response goes.
///
/// A `Req` is meant to be built fresh for each call: `submit` rewrites
/// `url` and `headers` in place.
///
/// ```no_run
/// use web_core::{Data, Req};
///
/// let mut n: i64 = 0;
/// let mut req = Req {
///     url: "http://localhost:3000/int".to_string(),
///     data: Data::record(&mut n),
///     ..Default::default()
/// };
/// req.submit()?;
/// # Ok::<(), web_core::WebError>(())
/// ```
#[derive(Debug, Default)]
pub struct Req<'a> {
    /// GET, POST, ... (default GET)
    pub method: String,
    /// Base URL, never with a query string.
    pub url: String,
    pub query: Query,
    pub headers: Headers,
    pub body: Body,
    pub data: Data<'a>,
    /// Deadline for the whole call. Falls back to the client's timeout.
    pub timeout: Option<Duration>,
    /// The raw response, set whenever a round trip was attempted.
    pub resp: Option<HttpResponse>,
}

impl<'a> Req<'a> {
    pub fn new(method: &str, url: &str) -> Self {
        Self {
            method: method.to_string(),
            url: url.to_string(),
            ..Default::default()
        }
    }

    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    pub fn data(mut self, data: Data<'a>) -> Self {
        self.data = data;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Send the request with the process-wide default client and decode
    /// the response into `data`.
    ///
    /// Anything but a 2xx response is an `HttpError`. See `Client::submit`.
    pub fn submit(&mut self) -> Result<(), WebError> {
        default_client().submit(self)
    }
}
