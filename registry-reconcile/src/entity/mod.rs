//! Entity kinds and their field groups.
//!
//! Each kind is described by a static [`Schema`]: its identity, the groups of
//! typed fields it carries and how every field maps onto the wire. Encoding
//! and decoding are driven entirely by these tables, so an optional protocol
//! feature is one more [`FieldGroup`] rather than another encoder.

use std::fmt;
use std::str::FromStr;

use crate::{
    collection,
    error::{DecodeError, EncodeError},
    extra::{self, Visibility},
    request::Request,
    response::ColumnarResponse,
    value::{AttributeValue, FieldKind, Payload},
};

mod contact;
mod domain;
mod nameserver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Domain,
    Contact,
    NameServer,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Domain, EntityKind::Contact, EntityKind::NameServer];

    /// The noun completing the command, as in `StatusNameserver`.
    pub fn noun(self) -> &'static str {
        match self {
            EntityKind::Domain => "Domain",
            EntityKind::Contact => "Contact",
            EntityKind::NameServer => "Nameserver",
        }
    }

    pub fn schema(self) -> &'static Schema {
        match self {
            EntityKind::Domain => &domain::SCHEMA,
            EntityKind::Contact => &contact::SCHEMA,
            EntityKind::NameServer => &nameserver::SCHEMA,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Domain => "domain",
            EntityKind::Contact => "contact",
            EntityKind::NameServer => "nameserver",
        };
        f.write_str(s)
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "domain" => Ok(EntityKind::Domain),
            "contact" => Ok(EntityKind::Contact),
            "nameserver" | "name-server" | "name_server" => Ok(EntityKind::NameServer),
            _ => Err(format!(
                "unknown entity kind `{}` (expected domain, contact or nameserver)",
                s
            )),
        }
    }
}

/// How a field travels to and from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wire {
    /// `WIRE = value`, Absent sending `""`. An empty column decodes as Absent.
    Scalar(&'static str),
    /// One position of a fixed-size tuple: sent as `{column}{index}`, read
    /// back with `indexed`.
    Packed { column: &'static str, index: usize },
    /// `1`/`0`. With `omit_absent` an Absent value sends nothing and a missing
    /// column decodes as Absent; otherwise Absent sends `0`.
    Flag {
        wire: &'static str,
        omit_absent: bool,
    },
    /// Decimal integer; Absent sends `default`, and an empty column decodes as it.
    Integer { wire: &'static str, default: i64 },
    /// Numbered entries, see [`collection::reconcile`]. Values in `ignore`
    /// are registry-managed and never sent nor decoded.
    Collection {
        prefix: &'static str,
        ignore: &'static [&'static str],
        max: Option<usize>,
    },
    /// Assigned by the registry: decoded from `column`, never sent.
    Computed { column: &'static str },
    /// The `X-` namespace.
    Extra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub wire: Wire,
}

/// Fields that belong to one protocol feature.
#[derive(Debug)]
pub struct FieldGroup {
    pub name: &'static str,
    pub fields: &'static [Field],
}

/// The identity of an entity: sent as `wire`, read back from `column`.
#[derive(Debug)]
pub struct Identity {
    pub field: &'static str,
    pub wire: &'static str,
    pub column: &'static str,
    /// Set when the registry picks the identity on creation.
    pub assigned: Option<Assigned>,
}

#[derive(Debug)]
pub struct Assigned {
    /// Entry sent instead of the identity on creation
    pub marker: (&'static str, &'static str),
    /// Column of the creation response holding the new identity
    pub column: &'static str,
}

#[derive(Debug)]
pub struct Schema {
    pub kind: EntityKind,
    pub identity: Identity,
    pub groups: &'static [FieldGroup],
    /// Entries every create and update carries
    pub constants: &'static [(&'static str, &'static str)],
    /// Optional scalars cleared through `DELETE{n}` on update, in order
    pub unset_candidates: &'static [&'static str],
}

impl Schema {
    pub fn fields(&self) -> impl Iterator<Item = &'static Field> + '_ {
        self.groups.iter().flat_map(|g| g.fields.iter())
    }

    /// Names of all fields, identity first.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.identity.field).chain(self.fields().map(|f| f.name))
    }

    pub fn field_kind(&self, name: &str) -> Option<FieldKind> {
        if name == self.identity.field {
            return Some(FieldKind::String);
        }
        self.fields().find(|f| f.name == name).map(|f| f.kind)
    }

    /// The field holding the `X-` namespace, if the kind has one.
    pub fn extra_field(&self) -> Option<&'static str> {
        self.fields()
            .find(|f| matches!(f.wire, Wire::Extra))
            .map(|f| f.name)
    }
}

impl Field {
    /// Add this field's entries to `request`.
    pub(crate) fn encode(
        &self,
        request: &mut Request,
        desired: &AttributeValue,
        prior: &AttributeValue,
    ) -> Result<(), EncodeError> {
        let name = self.name;
        match self.wire {
            Wire::Scalar(wire) => {
                request.insert(wire, desired.unbox_string(name, "")?);
            }
            Wire::Packed { column, index } => {
                request.insert(format!("{}{}", column, index), desired.unbox_string(name, "")?);
            }
            Wire::Flag { wire, omit_absent } => match desired.unbox_optional_bool(name)? {
                Some(b) => request.insert(wire, bool_to_flag(b)),
                None if omit_absent => {}
                None => request.insert(wire, bool_to_flag(false)),
            },
            Wire::Integer { wire, default } => {
                request.insert(wire, desired.unbox_int64(name, default)?.to_string());
            }
            Wire::Collection {
                prefix,
                ignore,
                max,
            } => {
                collection::encode_field(request, name, prefix, desired, prior, ignore, max)?;
            }
            // Usually still Unknown in a desired state; nothing to send either way
            Wire::Computed { .. } => {}
            Wire::Extra => {
                extra::write(
                    request,
                    name,
                    &desired.unbox_map(name)?,
                    &prior.unbox_map(name)?,
                )?;
            }
        }
        Ok(())
    }

    /// Rebuild this field from a response.
    pub(crate) fn decode(
        &self,
        response: &ColumnarResponse,
        visibility: &Visibility,
    ) -> Result<AttributeValue, DecodeError> {
        let value = match self.wire {
            Wire::Scalar(column) | Wire::Computed { column } => {
                non_empty(response.scalar(column, ""))
            }
            Wire::Packed { column, index } => non_empty(response.indexed(column, index, "")),
            Wire::Flag { wire, omit_absent } => {
                if omit_absent && response.scalar(wire, "").is_empty() {
                    AttributeValue::Absent
                } else {
                    AttributeValue::bool(response.boolean_flag(wire))
                }
            }
            Wire::Integer { wire, default } => AttributeValue::int64(response.integer(wire, default)?),
            Wire::Collection { prefix, ignore, .. } => {
                let values = response
                    .vector(prefix)
                    .iter()
                    .filter(|v| !ignore.contains(&v.as_str()))
                    .cloned();
                match self.kind {
                    FieldKind::Set => AttributeValue::Present(Payload::Set(
                        values.filter(|v| !v.is_empty()).collect(),
                    )),
                    _ => AttributeValue::Present(Payload::OrderedList(values.collect())),
                }
            }
            Wire::Extra => AttributeValue::Present(Payload::Map(extra::read(response, visibility))),
        };
        Ok(value)
    }
}

fn bool_to_flag(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

fn non_empty(s: &str) -> AttributeValue {
    if s.is_empty() {
        AttributeValue::Absent
    } else {
        AttributeValue::string(s)
    }
}
