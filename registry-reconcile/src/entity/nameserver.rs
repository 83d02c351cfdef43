use super::{EntityKind, Field, FieldGroup, Identity, Schema, Wire};
use crate::value::FieldKind;

pub(super) static SCHEMA: Schema = Schema {
    kind: EntityKind::NameServer,
    identity: Identity {
        field: "name_server",
        wire: "NAMESERVER",
        column: "HOST",
        assigned: None,
    },
    groups: &[FieldGroup {
        name: "addresses",
        fields: &[Field {
            name: "ip_addresses",
            kind: FieldKind::OrderedList,
            wire: Wire::Collection {
                prefix: "IPADDRESS",
                ignore: &[],
                max: Some(12),
            },
        }],
    }],
    constants: &[],
    unset_candidates: &[],
};

#[cfg(test)]
mod tests {
    use crate::{
        engine::{decode, encode, EngineOptions},
        extra::Visibility,
        request::Operation,
        response::ColumnarResponse,
        state::ResourceState,
        value::AttributeValue,
    };

    use super::*;

    #[test]
    fn read_carries_only_the_identity() {
        let mut desired = ResourceState::new(EntityKind::NameServer);
        desired
            .set("name_server", AttributeValue::string("ns1.example.com"))
            .unwrap();
        desired
            .set("ip_addresses", AttributeValue::list(["192.0.2.1"]))
            .unwrap();

        let req = encode(Operation::Read, &desired, None, &EngineOptions::default()).unwrap();
        assert_eq!(req.command(), "StatusNameserver");
        assert_eq!(req.get("NAMESERVER"), Some("ns1.example.com"));
        assert_eq!(req.len(), 2);
    }

    #[test]
    fn addresses_keep_their_order() {
        let addresses = ["192.0.2.9", "2001:db8::1", "192.0.2.1"];
        let resp = ColumnarResponse::success()
            .with_column("HOST", ["ns1.example.com"])
            .with_column("IPADDRESS", addresses);

        let state = decode(EntityKind::NameServer, &resp, &Visibility::All).unwrap();
        assert_eq!(state.get("ip_addresses"), &AttributeValue::list(addresses));
        assert_eq!(
            state.get("name_server"),
            &AttributeValue::string("ns1.example.com")
        );
    }

    #[test]
    fn no_extra_attributes() {
        assert_eq!(SCHEMA.extra_field(), None);
    }
}
