//! Numbered-key encoding of list and set fields.
//!
//! A collection is sent as `PREFIX0..PREFIXn`. Removals are expressed twice:
//! stale trailing slots are overwritten with `""` up to the length of the
//! prior collection, and every removed value is named in a
//! `DEL{PREFIX}{n}` directive. Protocols that model the field as a bank of
//! slots honor the first, protocols that delete by value honor the second.

use std::collections::HashSet;

use crate::{
    error::EncodeError,
    request::Request,
    value::{AttributeValue, Payload},
};

/// Emit the entries for one collection field.
///
/// Values in `ignore` are never counted, emitted or removed.
pub fn reconcile(
    request: &mut Request,
    prefix: &str,
    desired: &[String],
    prior: &[String],
    ignore: &[&str],
) {
    let ignored = |v: &str| ignore.iter().any(|i| *i == v);

    let mut seen: HashSet<&str> = HashSet::new();
    let mut i = 0;
    for value in desired.iter().filter(|v| !ignored(v.as_str())) {
        seen.insert(value.as_str());
        request.insert(format!("{}{}", prefix, i), value.as_str());
        i += 1;
    }

    // Positional clear, continuing the same counter
    while i < prior.len() {
        request.insert(format!("{}{}", prefix, i), "");
        i += 1;
    }

    // Value-keyed clear, with its own counter
    let removed = prior
        .iter()
        .filter(|v| !ignored(v.as_str()) && !seen.contains(v.as_str()));
    for (j, value) in removed.enumerate() {
        request.insert(format!("DEL{}{}", prefix, j), value.as_str());
    }
}

/// Resolve both sides of a collection field and emit its entries.
///
/// Either side being Unknown aborts before anything is written.
pub fn encode_field(
    request: &mut Request,
    field: &str,
    prefix: &str,
    desired: &AttributeValue,
    prior: &AttributeValue,
    ignore: &[&str],
    max: Option<usize>,
) -> Result<(), EncodeError> {
    // On the wire an empty element reads as a cleared slot
    if let Some(Payload::Set(values)) = desired.payload() {
        if values.contains("") {
            return Err(EncodeError::InvalidProperty {
                field: field.to_string(),
                reason: "set elements must not be empty".to_string(),
            });
        }
    }

    let desired = desired.unbox_list(field)?;
    let prior = prior.unbox_list(field)?;

    if let Some(max) = max {
        let count = desired
            .iter()
            .filter(|v| !ignore.iter().any(|i| *i == v.as_str()))
            .count();
        if count > max {
            return Err(EncodeError::TooManyValues {
                field: field.to_string(),
                max,
                count,
            });
        }
    }

    reconcile(request, prefix, &desired, &prior, ignore);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn entries(req: &Request) -> Vec<(String, String)> {
        req.iter()
            .filter(|(k, _)| *k != "COMMAND")
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn shrinking_list_emits_both_removal_forms() {
        let mut req = Request::new("ModifyDomain");
        reconcile(
            &mut req,
            "NAMESERVER",
            &strings(&["ns1.example.com"]),
            &strings(&["ns1.example.com", "ns2.example.com"]),
            &[],
        );
        assert_eq!(req.get("NAMESERVER0"), Some("ns1.example.com"));
        assert_eq!(req.get("NAMESERVER1"), Some(""));
        assert_eq!(req.get("DELNAMESERVER0"), Some("ns2.example.com"));
        assert_eq!(req.len(), 4);
    }

    #[test]
    fn growing_list_has_no_removals() {
        let mut req = Request::new("ModifyNameserver");
        reconcile(
            &mut req,
            "IPADDRESS",
            &strings(&["192.0.2.1", "192.0.2.2"]),
            &strings(&["192.0.2.1"]),
            &[],
        );
        assert_eq!(
            entries(&req),
            vec![
                ("IPADDRESS0".to_string(), "192.0.2.1".to_string()),
                ("IPADDRESS1".to_string(), "192.0.2.2".to_string()),
            ]
        );
    }

    #[test]
    fn ignored_values_are_invisible() {
        let mut req = Request::new("ModifyDomain");
        reconcile(
            &mut req,
            "STATUS",
            &strings(&["ACTIVE", "clientTransferProhibited"]),
            &strings(&["ACTIVE", "clientDeleteProhibited", "clientTransferProhibited"]),
            &["ACTIVE"],
        );
        assert_eq!(req.get("STATUS0"), Some("clientTransferProhibited"));
        assert_eq!(req.get("STATUS1"), Some(""));
        assert_eq!(req.get("STATUS2"), Some(""));
        assert_eq!(req.get("DELSTATUS0"), Some("clientDeleteProhibited"));
        assert!(!req.contains_key("DELSTATUS1"));
        assert!(req.iter().all(|(_, v)| v != "ACTIVE"));
    }

    #[test]
    fn set_difference() {
        let prior: BTreeSet<&str> = ["a", "b", "c"].into();
        let desired: BTreeSet<&str> = ["b", "c", "d", "e"].into();
        let mut req = Request::new("ModifyDomain");
        reconcile(
            &mut req,
            "SECDNS-DS",
            &desired.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
            &prior.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
            &[],
        );

        let numbered: BTreeSet<&str> = req
            .iter()
            .filter(|(k, v)| k.starts_with("SECDNS-DS") && !v.is_empty())
            .map(|(_, v)| v)
            .collect();
        let deleted: BTreeSet<&str> = req
            .iter()
            .filter(|(k, _)| k.starts_with("DELSECDNS-DS"))
            .map(|(_, v)| v)
            .collect();

        assert_eq!(numbered, desired);
        assert_eq!(
            deleted,
            prior.difference(&desired).copied().collect::<BTreeSet<&str>>()
        );
    }

    #[test]
    fn unknown_side_aborts() {
        let mut req = Request::new("ModifyDomain");
        let err = encode_field(
            &mut req,
            "name_servers",
            "NAMESERVER",
            &AttributeValue::set(["ns1.example.com"]),
            &AttributeValue::Unknown,
            &[],
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            EncodeError::AmbiguousValue {
                field: "name_servers".to_string()
            }
        );
        assert_eq!(req.len(), 1);
    }

    #[test]
    fn empty_set_element_is_rejected() {
        let mut req = Request::new("ModifyDomain");
        let err = encode_field(
            &mut req,
            "status",
            "STATUS",
            &AttributeValue::set(["clientHold", ""]),
            &AttributeValue::Absent,
            &[],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, EncodeError::InvalidProperty { .. }));
        assert_eq!(req.len(), 1);
    }

    #[test]
    fn bound_is_enforced() {
        let mut req = Request::new("ModifyDomain");
        let err = encode_field(
            &mut req,
            "owner_contacts",
            "OWNERCONTACT",
            &AttributeValue::set(["P-A", "P-B"]),
            &AttributeValue::Absent,
            &[],
            Some(1),
        )
        .unwrap_err();
        assert!(matches!(err, EncodeError::TooManyValues { max: 1, count: 2, .. }));
    }
}
