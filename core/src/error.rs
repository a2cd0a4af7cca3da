//! Error types for request submission.
//!
//! # Design
//! Descriptor misuse (`SyntaxError`) and non-2xx responses (`HttpError`) get
//! their own types because callers branch on them. Transport and codec
//! failures are passed through unchanged so the caller sees the underlying
//! cause, not a reinterpretation of it.

use thiserror::Error;

use crate::http::HttpResponse;

/// Boxed error used where the concrete type belongs to a collaborator
/// (transports, custom text marshalers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Anything outside the 200-299 range. Redirects have already been followed
/// by the transport by the time this is produced.
#[derive(Debug, Error)]
#[error("{}", .response.status_line())]
pub struct HttpError {
    pub response: HttpResponse,
}

impl HttpError {
    pub fn status(&self) -> u16 {
        self.response.status
    }
}

/// Incorrect definition of a `Req`, detected before any network I/O.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
}

impl SyntaxError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors returned by `Req::submit` and `Client::submit`.
#[derive(Debug, Error)]
pub enum WebError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Http(#[from] HttpError),

    /// DNS, connection and timeout failures, exactly as the transport
    /// reported them.
    #[error(transparent)]
    Transport(BoxError),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A `MarshalText` body failed to produce its text.
    #[error(transparent)]
    Marshal(BoxError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl WebError {
    /// The response carried by an `HttpError`, if this is one.
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            WebError::Http(e) => Some(&e.response),
            _ => None,
        }
    }
}
