//! Human-friendly HTTP requests.
//!
//! # Overview
//! A `Req` describes one request (method, URL, query, headers, body) and
//! where its response should go. `Req::submit` sends it with a timeout,
//! checks the status and decodes the body into the caller's destination.
//! It trades precision for convenience: one value per header name, the
//! query string always URL-encoded, no multi-part MIME.
//!
//! # Design
//! - `Body` and `Data` are closed enums whose variant order is the
//!   marshaling and decoding priority.
//! - `Client` carries the transport and default timeout; a process-wide
//!   default backs `Req::submit` and can be swapped for tests.
//! - `Transport` is the network seam. `UreqTransport` is the default.
//! - Responses are decoded with serde_yaml, so JSON and YAML bodies both
//!   land in maps and typed records.

pub mod body;
pub mod client;
pub mod data;
pub mod error;
pub mod http;
pub mod req;
pub mod transport;

pub use body::{encode_query, Body, MarshalText, Query};
pub use client::{default_client, set_default_client, set_default_timeout, Client, DEFAULT_TIMEOUT_SECS};
pub use data::{Data, Overlay, Replace, UnmarshalYaml};
pub use error::{BoxError, HttpError, SyntaxError, WebError};
pub use http::{HttpRequest, HttpResponse};
pub use req::{Headers, Req};
pub use transport::{Incoming, Transport, UreqTransport};
