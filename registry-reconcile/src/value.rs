//! Tri-state attribute values.
//!
//! Every field of a [`crate::state::ResourceState`] is either not determined
//! yet ([`AttributeValue::Unknown`]), explicitly unset
//! ([`AttributeValue::Absent`]) or holds a typed [`Payload`]. The unboxing
//! helpers are the only way the encoders read values: they substitute a
//! default for Absent and refuse Unknown, so that an undetermined value can
//! never be sent as if it were empty.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::Value;

use crate::error::EncodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    String,
    Bool,
    Int64,
    OrderedList,
    Set,
    Map,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldKind::String => "string",
            FieldKind::Bool => "bool",
            FieldKind::Int64 => "int64",
            FieldKind::OrderedList => "list",
            FieldKind::Set => "set",
            FieldKind::Map => "map",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    String(String),
    Bool(bool),
    Int64(i64),
    OrderedList(Vec<String>),
    Set(BTreeSet<String>),
    Map(BTreeMap<String, String>),
}

impl Payload {
    pub fn kind(&self) -> FieldKind {
        match self {
            Payload::String(_) => FieldKind::String,
            Payload::Bool(_) => FieldKind::Bool,
            Payload::Int64(_) => FieldKind::Int64,
            Payload::OrderedList(_) => FieldKind::OrderedList,
            Payload::Set(_) => FieldKind::Set,
            Payload::Map(_) => FieldKind::Map,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Payload::String(s) => Value::String(s.clone()),
            Payload::Bool(b) => Value::Bool(*b),
            Payload::Int64(i) => Value::from(*i),
            Payload::OrderedList(l) => Value::from(l.clone()),
            Payload::Set(s) => Value::from(s.iter().cloned().collect::<Vec<_>>()),
            Payload::Map(m) => Value::Object(
                m.iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
        }
    }

    /// Parse a JSON property as a payload of the given kind.
    pub fn from_json(field: &str, kind: FieldKind, value: &Value) -> Result<Payload, EncodeError> {
        let invalid = |reason: &str| EncodeError::InvalidProperty {
            field: field.to_string(),
            reason: reason.to_string(),
        };
        match kind {
            FieldKind::String => value
                .as_str()
                .map(|s| Payload::String(s.to_string()))
                .ok_or_else(|| invalid("expected a string")),
            FieldKind::Bool => value
                .as_bool()
                .map(Payload::Bool)
                .ok_or_else(|| invalid("expected a boolean")),
            FieldKind::Int64 => value
                .as_i64()
                .map(Payload::Int64)
                .ok_or_else(|| invalid("expected a 64-bit integer")),
            FieldKind::OrderedList => string_elements(value)
                .map(Payload::OrderedList)
                .ok_or_else(|| invalid("expected an array of strings")),
            FieldKind::Set => {
                let elements =
                    string_elements(value).ok_or_else(|| invalid("expected an array of strings"))?;
                if elements.iter().any(String::is_empty) {
                    return Err(invalid("set elements must not be empty"));
                }
                Ok(Payload::Set(elements.into_iter().collect()))
            }
            FieldKind::Map => {
                let object = value
                    .as_object()
                    .ok_or_else(|| invalid("expected an object of strings"))?;
                let mut map = BTreeMap::new();
                for (k, v) in object {
                    let v = v
                        .as_str()
                        .ok_or_else(|| invalid(&format!("entry `{}` is not a string", k)))?;
                    map.insert(k.clone(), v.to_string());
                }
                Ok(Payload::Map(map))
            }
        }
    }
}

fn string_elements(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AttributeValue {
    /// Not determined yet, e.g. still being computed upstream
    Unknown,
    /// Explicitly unset
    #[default]
    Absent,
    Present(Payload),
}

impl AttributeValue {
    pub fn string(s: impl Into<String>) -> Self {
        AttributeValue::Present(Payload::String(s.into()))
    }

    pub fn bool(b: bool) -> Self {
        AttributeValue::Present(Payload::Bool(b))
    }

    pub fn int64(i: i64) -> Self {
        AttributeValue::Present(Payload::Int64(i))
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AttributeValue::Present(Payload::OrderedList(
            items.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn set<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AttributeValue::Present(Payload::Set(items.into_iter().map(Into::into).collect()))
    }

    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        AttributeValue::Present(Payload::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, AttributeValue::Unknown)
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, AttributeValue::Absent)
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            AttributeValue::Present(p) => Some(p),
            _ => None,
        }
    }

    fn resolve(&self, field: &str) -> Result<Option<&Payload>, EncodeError> {
        match self {
            AttributeValue::Unknown => Err(EncodeError::AmbiguousValue {
                field: field.to_string(),
            }),
            AttributeValue::Absent => Ok(None),
            AttributeValue::Present(p) => Ok(Some(p)),
        }
    }

    pub fn unbox_string(&self, field: &str, default: &str) -> Result<String, EncodeError> {
        match self.resolve(field)? {
            None => Ok(default.to_string()),
            Some(Payload::String(s)) => Ok(s.clone()),
            Some(other) => Err(mismatch(field, FieldKind::String, other)),
        }
    }

    pub fn unbox_bool(&self, field: &str, default: bool) -> Result<bool, EncodeError> {
        match self.resolve(field)? {
            None => Ok(default),
            Some(Payload::Bool(b)) => Ok(*b),
            Some(other) => Err(mismatch(field, FieldKind::Bool, other)),
        }
    }

    /// Like [`Self::unbox_bool`], but keeps Absent distinguishable.
    pub fn unbox_optional_bool(&self, field: &str) -> Result<Option<bool>, EncodeError> {
        match self.resolve(field)? {
            None => Ok(None),
            Some(Payload::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(mismatch(field, FieldKind::Bool, other)),
        }
    }

    pub fn unbox_int64(&self, field: &str, default: i64) -> Result<i64, EncodeError> {
        match self.resolve(field)? {
            None => Ok(default),
            Some(Payload::Int64(i)) => Ok(*i),
            Some(other) => Err(mismatch(field, FieldKind::Int64, other)),
        }
    }

    /// Elements of an ordered list or a set; Absent is the empty sequence.
    pub fn unbox_list(&self, field: &str) -> Result<Vec<String>, EncodeError> {
        match self.resolve(field)? {
            None => Ok(Vec::new()),
            Some(Payload::OrderedList(l)) => Ok(l.clone()),
            Some(Payload::Set(s)) => Ok(s.iter().cloned().collect()),
            Some(other) => Err(mismatch(field, FieldKind::OrderedList, other)),
        }
    }

    pub fn unbox_map(&self, field: &str) -> Result<BTreeMap<String, String>, EncodeError> {
        match self.resolve(field)? {
            None => Ok(BTreeMap::new()),
            Some(Payload::Map(m)) => Ok(m.clone()),
            Some(other) => Err(mismatch(field, FieldKind::Map, other)),
        }
    }
}

fn mismatch(field: &str, expected: FieldKind, found: &Payload) -> EncodeError {
    EncodeError::TypeMismatch {
        field: field.to_string(),
        expected,
        found: found.kind(),
    }
}
