use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::{
    entity::EntityKind,
    error::EncodeError,
    value::{AttributeValue, Payload},
};

static ABSENT: AttributeValue = AttributeValue::Absent;

/// The attribute values of one entity instance.
///
/// Only fields declared by the kind's schema can be set, and only with a
/// payload of the declared kind. Fields never set read as Absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceState {
    kind: EntityKind,
    values: BTreeMap<&'static str, AttributeValue>,
}

impl ResourceState {
    pub fn new(kind: EntityKind) -> Self {
        ResourceState {
            kind,
            values: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn get(&self, field: &str) -> &AttributeValue {
        self.values.get(field).unwrap_or(&ABSENT)
    }

    pub fn set(&mut self, field: &str, value: AttributeValue) -> Result<(), EncodeError> {
        let schema = self.kind.schema();
        let (name, expected) = schema
            .field_names()
            .find(|n| *n == field)
            .and_then(|n| schema.field_kind(n).map(|k| (n, k)))
            .ok_or_else(|| EncodeError::UnknownField {
                kind: self.kind,
                field: field.to_string(),
            })?;
        if let AttributeValue::Present(payload) = &value {
            if payload.kind() != expected {
                return Err(EncodeError::TypeMismatch {
                    field: field.to_string(),
                    expected,
                    found: payload.kind(),
                });
            }
        }
        self.values.insert(name, value);
        Ok(())
    }

    /// Mark a field as not determined yet.
    pub fn mark_unknown(&mut self, field: &str) -> Result<(), EncodeError> {
        self.set(field, AttributeValue::Unknown)
    }

    pub fn identity(&self) -> &AttributeValue {
        self.get(self.kind.schema().identity.field)
    }

    /// Keys of the `X-` namespace, for steady-state reads.
    pub fn extra_attribute_keys(&self) -> Vec<String> {
        let Some(field) = self.kind.schema().extra_field() else {
            return Vec::new();
        };
        match self.get(field) {
            AttributeValue::Present(Payload::Map(m)) => m.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// All fields in schema order, Absent included.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &AttributeValue)> + '_ {
        self.kind
            .schema()
            .field_names()
            .map(move |name| (name, self.get(name)))
    }

    /// Build a state from JSON properties keyed by field name; `null` is Absent.
    pub fn from_properties(
        kind: EntityKind,
        properties: &Map<String, Value>,
    ) -> Result<Self, EncodeError> {
        let mut state = ResourceState::new(kind);
        for (field, value) in properties {
            let expected = kind
                .schema()
                .field_kind(field)
                .ok_or_else(|| EncodeError::UnknownField {
                    kind,
                    field: field.clone(),
                })?;
            let value = match value {
                Value::Null => AttributeValue::Absent,
                v => AttributeValue::Present(Payload::from_json(field, expected, v)?),
            };
            state.set(field, value)?;
        }
        Ok(state)
    }

    /// Render every field as JSON, Absent as `null`. Fails on Unknown values.
    pub fn to_properties(&self) -> Result<Map<String, Value>, EncodeError> {
        let mut properties = Map::new();
        for (name, value) in self.iter() {
            let json = match value {
                AttributeValue::Unknown => {
                    return Err(EncodeError::AmbiguousValue {
                        field: name.to_string(),
                    })
                }
                AttributeValue::Absent => Value::Null,
                AttributeValue::Present(payload) => payload.to_json(),
            };
            properties.insert(name.to_string(), json);
        }
        Ok(properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldKind;
    use serde_json::json;

    fn properties(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn unset_fields_read_absent() {
        let state = ResourceState::new(EntityKind::Contact);
        assert_eq!(state.get("fax"), &AttributeValue::Absent);
        assert_eq!(state.identity(), &AttributeValue::Absent);
    }

    #[test]
    fn set_validates_field_and_kind() {
        let mut state = ResourceState::new(EntityKind::NameServer);
        assert_eq!(
            state.set("fax", AttributeValue::string("x")).unwrap_err(),
            EncodeError::UnknownField {
                kind: EntityKind::NameServer,
                field: "fax".to_string(),
            }
        );
        assert_eq!(
            state
                .set("ip_addresses", AttributeValue::set(["192.0.2.1"]))
                .unwrap_err(),
            EncodeError::TypeMismatch {
                field: "ip_addresses".to_string(),
                expected: FieldKind::OrderedList,
                found: FieldKind::Set,
            }
        );
        state.mark_unknown("ip_addresses").unwrap();
        assert!(state.get("ip_addresses").is_unknown());
    }

    #[test]
    fn properties_follow_the_schema_kinds() {
        let state = ResourceState::from_properties(
            EntityKind::Domain,
            &properties(json!({
                "domain": "example.com",
                "name_servers": ["ns2.example.com", "ns1.example.com"],
                "transfer_lock": true,
                "dnssec_max_sig_lifespan": 3600,
                "extra_attributes": {"FOO": "bar"},
                "auth_code": null,
            })),
        )
        .unwrap();

        assert_eq!(state.identity(), &AttributeValue::string("example.com"));
        assert_eq!(
            state.get("name_servers"),
            &AttributeValue::set(["ns1.example.com", "ns2.example.com"])
        );
        assert_eq!(state.get("auth_code"), &AttributeValue::Absent);
        assert_eq!(state.extra_attribute_keys(), vec!["FOO".to_string()]);

        let out = state.to_properties().unwrap();
        assert_eq!(out["name_servers"], json!(["ns1.example.com", "ns2.example.com"]));
        assert_eq!(out["dnssec_max_sig_lifespan"], json!(3600));
        assert_eq!(out["whois_banner"], Value::Null);
        assert_eq!(out.len(), EntityKind::Domain.schema().field_names().count());
    }

    #[test]
    fn unknown_field_in_properties() {
        let err = ResourceState::from_properties(
            EntityKind::NameServer,
            &properties(json!({"hostname": "ns1.example.com"})),
        )
        .unwrap_err();
        assert!(matches!(err, EncodeError::UnknownField { .. }));
    }

    #[test]
    fn unknown_values_do_not_serialize() {
        let mut state = ResourceState::new(EntityKind::Contact);
        state.mark_unknown("email").unwrap();
        assert_eq!(
            state.to_properties().unwrap_err(),
            EncodeError::AmbiguousValue {
                field: "email".to_string()
            }
        );
    }
}
