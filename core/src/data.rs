//! Response destinations.
//!
//! # Design
//! `Data` borrows the caller's storage so decoded values are written through
//! the reference and observed by the caller after `submit`. Variant order is
//! the dispatch priority. Decoding goes through serde_yaml, which accepts JSON
//! payloads as well as YAML.

use std::io::Write;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::error::{SyntaxError, WebError};

/// A value that decodes itself from a parsed YAML node.
pub trait UnmarshalYaml {
    fn unmarshal_yaml(&mut self, value: Value) -> Result<(), serde_yaml::Error>;
}

/// Decode a YAML node on top of an existing value: fields present in the
/// node overwrite, fields absent keep what the value already had.
///
/// Implemented for every type that is both `Serialize` and `DeserializeOwned`.
pub trait Overlay {
    fn overlay(&mut self, decoded: Value) -> Result<(), serde_yaml::Error>;
}

impl<T: Serialize + DeserializeOwned> Overlay for T {
    fn overlay(&mut self, decoded: Value) -> Result<(), serde_yaml::Error> {
        if decoded.is_null() {
            return Ok(());
        }
        let mut current = serde_yaml::to_value(&*self)?;
        merge(&mut current, decoded);
        *self = serde_yaml::from_value(current)?;
        Ok(())
    }
}

/// Decode a YAML node into a fresh value that replaces the current one.
///
/// Implemented for every `DeserializeOwned` type, so it needs no `Serialize`.
pub trait Replace {
    fn replace_yaml(&mut self, decoded: Value) -> Result<(), serde_yaml::Error>;
}

impl<T: DeserializeOwned> Replace for T {
    fn replace_yaml(&mut self, decoded: Value) -> Result<(), serde_yaml::Error> {
        if decoded.is_null() {
            return Ok(());
        }
        *self = serde_yaml::from_value(decoded)?;
        Ok(())
    }
}

fn merge(current: &mut Value, decoded: Value) {
    match (current, decoded) {
        (Value::Mapping(current), Value::Mapping(decoded)) => {
            for (key, value) in decoded {
                match current.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        current.insert(key, value);
                    }
                }
            }
        }
        (current, decoded) => *current = decoded,
    }
}

/// Where the response body goes.
#[derive(Default)]
pub enum Data<'a> {
    /// Nothing is decoded; the body is still available on `Req::resp`.
    #[default]
    Discard,
    /// Untyped mapping. Decoded keys are merged into it.
    Map(&'a mut Mapping),
    /// Raw response text.
    Text(&'a mut String),
    /// Planned to be uudecoded. Not supported.
    Bytes(&'a mut Vec<u8>),
    Unmarshal(&'a mut dyn UnmarshalYaml),
    /// Receives the raw bytes, undecoded.
    Writer(&'a mut dyn Write),
    /// Not supported.
    PrettyJson(&'a mut serde_json::Value),
    /// Typed records, numbers and anything else serde can round-trip.
    Record(&'a mut dyn Overlay),
    /// Deserialize-only types. The decoded value replaces the whole target,
    /// so fields absent from the payload take their serde defaults.
    Replace(&'a mut dyn Replace),
}

impl<'a> Data<'a> {
    /// Overlay decoding into `value`. Needs `Serialize` as well as
    /// `Deserialize`; use `Data::replace` for types that only deserialize.
    pub fn record<T: Overlay>(value: &'a mut T) -> Self {
        Data::Record(value)
    }

    pub fn replace<T: Replace>(value: &'a mut T) -> Self {
        Data::Replace(value)
    }

    /// Reject destinations that can never be decoded, before any I/O.
    pub(crate) fn check(&self) -> Result<(), SyntaxError> {
        match self {
            Data::Bytes(_) => {
                log::warn!("binary destination requested: uudecoding is not implemented");
                Err(SyntaxError::new(
                    "binary destination is not supported (uudecoding not implemented)",
                ))
            }
            Data::PrettyJson(_) => {
                log::warn!("pretty JSON destination requested: not implemented");
                Err(SyntaxError::new("pretty JSON destination is not supported"))
            }
            _ => Ok(()),
        }
    }

    /// Decode a non-empty body into the destination.
    pub(crate) fn decode(&mut self, body: &[u8]) -> Result<(), WebError> {
        self.check()?;
        match self {
            Data::Discard => {}
            Data::Map(map) => {
                let value: Value = serde_yaml::from_slice(body)?;
                if !value.is_null() {
                    let decoded: Mapping = serde_yaml::from_value(value)?;
                    map.extend(decoded);
                }
            }
            Data::Text(text) => **text = String::from_utf8_lossy(body).into_owned(),
            Data::Bytes(_) | Data::PrettyJson(_) => {}
            Data::Unmarshal(target) => {
                let value: Value = serde_yaml::from_slice(body)?;
                target.unmarshal_yaml(value)?;
            }
            Data::Writer(writer) => writer.write_all(body)?,
            Data::Record(target) => {
                let value: Value = serde_yaml::from_slice(body)?;
                target.overlay(value)?;
            }
            Data::Replace(target) => {
                let value: Value = serde_yaml::from_slice(body)?;
                target.replace_yaml(value)?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Data<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Data::Discard => "Discard",
            Data::Map(_) => "Map",
            Data::Text(_) => "Text",
            Data::Bytes(_) => "Bytes",
            Data::Unmarshal(_) => "Unmarshal",
            Data::Writer(_) => "Writer",
            Data::PrettyJson(_) => "PrettyJson",
            Data::Record(_) => "Record",
            Data::Replace(_) => "Replace",
        };
        write!(f, "Data::{kind}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct Reply {
        post: String,
        #[serde(rename = "c")]
        changed: String,
        #[serde(rename = "i")]
        ignored: String,
    }

    #[derive(Default)]
    struct Names(Vec<String>);

    impl UnmarshalYaml for Names {
        fn unmarshal_yaml(&mut self, value: Value) -> Result<(), serde_yaml::Error> {
            self.0 = serde_yaml::from_value(value)?;
            Ok(())
        }
    }

    #[test]
    fn map_decodes_json_object() {
        let mut map = Mapping::new();
        Data::Map(&mut map).decode(br#"{"get":"WORKED"}"#).unwrap();
        assert_eq!(map.get("get"), Some(&Value::from("WORKED")));
    }

    #[test]
    fn map_merges_into_existing_keys() {
        let mut map = Mapping::new();
        map.insert("keep".into(), "me".into());
        Data::Map(&mut map).decode(b"added: 1\n").unwrap();
        assert_eq!(map.get("keep"), Some(&Value::from("me")));
        assert_eq!(map.get("added"), Some(&Value::from(1)));
    }

    #[test]
    fn map_rejects_non_mapping_payload() {
        let mut map = Mapping::new();
        let err = Data::Map(&mut map).decode(b"- a\n- b\n").unwrap_err();
        assert!(matches!(err, WebError::Yaml(_)));
    }

    #[test]
    fn text_is_written_through() {
        let mut text = String::from("before");
        Data::Text(&mut text).decode(b"after").unwrap();
        assert_eq!(text, "after");
    }

    #[test]
    fn record_overlays_present_fields_only() {
        let mut reply = Reply {
            changed: "o".to_string(),
            ignored: "i".to_string(),
            ..Default::default()
        };
        Data::record(&mut reply)
            .decode(br#"{"post":"t","c":"t"}"#)
            .unwrap();
        assert_eq!(reply.post, "t");
        assert_eq!(reply.changed, "t");
        assert_eq!(reply.ignored, "i");
    }

    #[test]
    fn record_decodes_bare_integer() {
        let mut n: i64 = 0;
        Data::record(&mut n).decode(b"20220322075441").unwrap();
        assert_eq!(n, 20220322075441);
    }

    #[test]
    fn record_ignores_null_payload() {
        let mut reply = Reply {
            post: "kept".to_string(),
            ..Default::default()
        };
        Data::record(&mut reply).decode(b"null").unwrap();
        assert_eq!(reply.post, "kept");
    }

    #[test]
    fn map_ignores_null_payload() {
        let mut map = Mapping::new();
        map.insert("keep".into(), "me".into());
        Data::Map(&mut map).decode(b"null").unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("keep"), Some(&Value::from("me")));
    }

    #[test]
    fn replace_decodes_deserialize_only_type() {
        #[derive(Debug, Default, Deserialize, PartialEq)]
        struct Status {
            state: String,
            #[serde(default)]
            retries: u32,
        }
        let mut status = Status {
            state: "old".to_string(),
            retries: 9,
        };
        Data::replace(&mut status).decode(br#"{"state":"ok"}"#).unwrap();
        assert_eq!(
            status,
            Status {
                state: "ok".to_string(),
                retries: 0,
            }
        );

        Data::replace(&mut status).decode(b"~").unwrap();
        assert_eq!(status.state, "ok");
    }

    #[test]
    fn record_type_mismatch_is_yaml_error() {
        let mut n: i64 = 0;
        let err = Data::record(&mut n).decode(b"not a number").unwrap_err();
        assert!(matches!(err, WebError::Yaml(_)));
        assert_eq!(n, 0);
    }

    #[test]
    fn nested_records_merge() {
        #[derive(Default, Serialize, Deserialize)]
        struct Outer {
            inner: Reply,
            count: u32,
        }
        let mut outer = Outer::default();
        outer.inner.ignored = "i".to_string();
        Data::record(&mut outer)
            .decode(b"inner:\n  post: t\ncount: 3\n")
            .unwrap();
        assert_eq!(outer.inner.post, "t");
        assert_eq!(outer.inner.ignored, "i");
        assert_eq!(outer.count, 3);
    }

    #[test]
    fn unmarshal_receives_parsed_node() {
        let mut names = Names::default();
        Data::Unmarshal(&mut names).decode(b"[a, b]").unwrap();
        assert_eq!(names.0, vec!["a", "b"]);
    }

    #[test]
    fn writer_receives_raw_bytes() {
        let mut out: Vec<u8> = Vec::new();
        Data::Writer(&mut out).decode(b"raw: {not decoded").unwrap();
        assert_eq!(out, b"raw: {not decoded");
    }

    #[test]
    fn unsupported_destinations_fail_check() {
        let mut bytes = Vec::new();
        let mut json = serde_json::Value::Null;
        assert!(Data::Bytes(&mut bytes).check().is_err());
        assert!(Data::PrettyJson(&mut json).check().is_err());
        assert!(Data::Discard.check().is_ok());
    }
}
