use super::{EntityKind, Field, FieldGroup, Identity, Schema, Wire};
use crate::value::FieldKind;

const MAX_NAME_SERVERS: usize = 12;
const MAX_CONTACTS_PER_ROLE: usize = 3;

const fn set(name: &'static str, prefix: &'static str, max: Option<usize>) -> Field {
    Field {
        name,
        kind: FieldKind::Set,
        wire: Wire::Collection {
            prefix,
            ignore: &[],
            max,
        },
    }
}

const fn contacts(name: &'static str, prefix: &'static str) -> Field {
    set(name, prefix, Some(MAX_CONTACTS_PER_ROLE))
}

pub(super) static SCHEMA: Schema = Schema {
    kind: EntityKind::Domain,
    identity: Identity {
        field: "domain",
        wire: "DOMAIN",
        column: "ID",
        assigned: None,
    },
    groups: &[
        FieldGroup {
            name: "registration",
            fields: &[
                set("name_servers", "NAMESERVER", Some(MAX_NAME_SERVERS)),
                Field {
                    name: "status",
                    kind: FieldKind::Set,
                    wire: Wire::Collection {
                        prefix: "STATUS",
                        // Set by the registry, not by us
                        ignore: &["ACTIVE"],
                        max: None,
                    },
                },
                Field {
                    name: "auth_code",
                    kind: FieldKind::String,
                    wire: Wire::Computed { column: "AUTH" },
                },
                Field {
                    name: "transfer_lock",
                    kind: FieldKind::Bool,
                    wire: Wire::Flag {
                        wire: "TRANSFERLOCK",
                        omit_absent: true,
                    },
                },
            ],
        },
        FieldGroup {
            name: "contacts",
            fields: &[
                set("owner_contacts", "OWNERCONTACT", Some(1)),
                contacts("admin_contacts", "ADMINCONTACT"),
                contacts("tech_contacts", "TECHCONTACT"),
                contacts("billing_contacts", "BILLINGCONTACT"),
            ],
        },
        FieldGroup {
            name: "whois banner",
            fields: &[Field {
                name: "whois_banner",
                kind: FieldKind::OrderedList,
                wire: Wire::Collection {
                    prefix: "WHOIS-BANNER",
                    ignore: &[],
                    max: Some(3),
                },
            }],
        },
        FieldGroup {
            name: "dnssec",
            fields: &[
                set("dnssec_ds_records", "SECDNS-DS", None),
                set("dnssec_dnskey_records", "SECDNS-KEY", None),
                Field {
                    name: "dnssec_max_sig_lifespan",
                    kind: FieldKind::Int64,
                    wire: Wire::Integer {
                        wire: "SECDNS-MAXSIGLIFE",
                        default: 0,
                    },
                },
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
    // Never provision anything that was not explicitly requested
    constants: &[("INTERNALDNS", "0")],
    unset_candidates: &[],
};
