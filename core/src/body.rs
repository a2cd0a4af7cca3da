//! Request bodies and query strings.
//!
//! # Design
//! `Body` is a closed set of the kinds of value a request can carry. The
//! variant order is the dispatch priority: a value that can be marshaled as
//! JSON is sent as JSON, not through its generic formatting.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use url::form_urlencoded;

use crate::error::{BoxError, WebError};

/// Query string or form values. Keys encode in sorted order; a key may carry
/// several values.
pub type Query = BTreeMap<String, Vec<String>>;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// URL-encode `query` as `k=v&k=v`. Keys with no values are skipped.
pub fn encode_query(query: &Query) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, values) in query {
        for value in values {
            serializer.append_pair(key, value);
        }
    }
    serializer.finish()
}

/// A value that can render itself as text for the wire.
pub trait MarshalText {
    fn marshal_text(&self) -> Result<String, BoxError>;
}

/// What gets sent as the data portion of a request.
#[derive(Default)]
pub enum Body {
    #[default]
    Empty,
    /// Form-encoded; also sets the form content type.
    Form(Query),
    /// Planned to be uuencoded. Not implemented: sends no bytes.
    Bytes(Vec<u8>),
    Text(String),
    Yaml(serde_yaml::Value),
    Json(serde_json::Value),
    Marshal(Box<dyn MarshalText + Send + Sync>),
    Display(Box<dyn fmt::Display + Send + Sync>),
    Debug(Box<dyn fmt::Debug + Send + Sync>),
}

/// A serialized body and the content type it implies, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub text: String,
    pub content_type: Option<&'static str>,
}

impl Body {
    pub fn yaml<T: Serialize>(value: &T) -> Result<Self, WebError> {
        Ok(Body::Yaml(serde_yaml::to_value(value)?))
    }

    pub fn json<T: Serialize>(value: &T) -> Result<Self, WebError> {
        Ok(Body::Json(serde_json::to_value(value)?))
    }

    pub fn marshal(value: impl MarshalText + Send + Sync + 'static) -> Self {
        Body::Marshal(Box::new(value))
    }

    pub fn display(value: impl fmt::Display + Send + Sync + 'static) -> Self {
        Body::Display(Box::new(value))
    }

    pub fn debug(value: impl fmt::Debug + Send + Sync + 'static) -> Self {
        Body::Debug(Box::new(value))
    }

    pub fn encode(&self) -> Result<Encoded, WebError> {
        let mut content_type = None;
        let text = match self {
            Body::Empty => String::new(),
            Body::Form(values) => {
                content_type = Some(FORM_CONTENT_TYPE);
                encode_query(values)
            }
            Body::Bytes(bytes) => {
                log::warn!(
                    "binary body of {} bytes not sent: uuencoding is not implemented",
                    bytes.len()
                );
                String::new()
            }
            Body::Text(text) => text.clone(),
            Body::Yaml(value) => serde_yaml::to_string(value)?,
            Body::Json(value) => serde_json::to_string(value)?,
            Body::Marshal(value) => value.marshal_text().map_err(WebError::Marshal)?,
            Body::Display(value) => value.to_string(),
            Body::Debug(value) => format!("{value:?}"),
        };
        Ok(Encoded { text, content_type })
    }

    fn kind(&self) -> &'static str {
        match self {
            Body::Empty => "Empty",
            Body::Form(_) => "Form",
            Body::Bytes(_) => "Bytes",
            Body::Text(_) => "Text",
            Body::Yaml(_) => "Yaml",
            Body::Json(_) => "Json",
            Body::Marshal(_) => "Marshal",
            Body::Display(_) => "Display",
            Body::Debug(_) => "Debug",
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Body::{}", self.kind())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<Query> for Body {
    fn from(values: Query) -> Self {
        Body::Form(values)
    }
}
