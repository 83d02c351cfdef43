use super::{Assigned, EntityKind, Field, FieldGroup, Identity, Schema, Wire};
use crate::value::FieldKind;

const fn scalar(name: &'static str, wire: &'static str) -> Field {
    Field {
        name,
        kind: FieldKind::String,
        wire: Wire::Scalar(wire),
    }
}

const fn street(name: &'static str, index: usize) -> Field {
    Field {
        name,
        kind: FieldKind::String,
        wire: Wire::Packed {
            column: "STREET",
            index,
        },
    }
}

pub(super) static SCHEMA: Schema = Schema {
    kind: EntityKind::Contact,
    identity: Identity {
        field: "id",
        wire: "CONTACT",
        column: "ID",
        assigned: Some(Assigned {
            marker: ("NEW", "1"),
            column: "CONTACT",
        }),
    },
    groups: &[
        FieldGroup {
            name: "name",
            fields: &[
                scalar("title", "TITLE"),
                scalar("first_name", "FIRSTNAME"),
                scalar("middle_name", "MIDDLENAME"),
                scalar("last_name", "LASTNAME"),
                scalar("organization", "ORGANIZATION"),
            ],
        },
        FieldGroup {
            name: "address",
            fields: &[
                street("address_line_1", 0),
                street("address_line_2", 1),
                scalar("city", "CITY"),
                scalar("state", "STATE"),
                scalar("zip", "ZIP"),
                scalar("country", "COUNTRY"),
            ],
        },
        FieldGroup {
            name: "communication",
            fields: &[
                scalar("phone", "PHONE"),
                scalar("fax", "FAX"),
                scalar("email", "EMAIL"),
                Field {
                    name: "disclose",
                    kind: FieldKind::Bool,
                    wire: Wire::Flag {
                        wire: "DISCLOSE",
                        omit_absent: false,
                    },
                },
            ],
        },
        FieldGroup {
            name: "identification",
            fields: &[
                scalar("vat_id", "VATID"),
                scalar("id_authority", "IDAUTHORITY"),
                scalar("id_number", "IDNUMBER"),
            ],
        },
        FieldGroup {
            name: "extra attributes",
            fields: &[Field {
                name: "extra_attributes",
                kind: FieldKind::Map,
                wire: Wire::Extra,
            }],
        },
    ],
    constants: &[],
    unset_candidates: &[
        "TITLE",
        "MIDDLENAME",
        "ORGANIZATION",
        "STATE",
        "FAX",
        "VATID",
        "IDAUTHORITY",
        "IDNUMBER",
    ],
};
