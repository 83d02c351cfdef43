//! User-defined `X-` attributes.
//!
//! Keys are free-form, carried uppercase on the wire behind a fixed prefix.
//! Writing sends only added, changed and removed keys; reading is filtered by
//! an explicit [`Visibility`] so that steady-state reads do not adopt
//! attributes nobody asked to manage.

use std::collections::{BTreeMap, BTreeSet};

use crate::{error::EncodeError, request::Request, response::ColumnarResponse};

pub const WIRE_PREFIX: &str = "X-";

/// Which dynamic attributes a read imports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    /// Every prefixed column (full import)
    All,
    /// Only keys in the reference set (steady state); keys are uppercase
    Known(BTreeSet<String>),
}

impl Visibility {
    pub fn known<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Visibility::Known(keys.into_iter().map(|k| normalize(k.as_ref())).collect())
    }

    pub fn admits(&self, key: &str) -> bool {
        match self {
            Visibility::All => true,
            Visibility::Known(keys) => keys.contains(key),
        }
    }
}

pub fn normalize(key: &str) -> String {
    key.to_uppercase()
}

pub fn wire_name(key: &str) -> String {
    format!("{}{}", WIRE_PREFIX, normalize(key))
}

/// The normalized key of an `X-`/`x-` column, if it is one.
fn column_key(column: &str) -> Option<String> {
    let mut chars = column.chars();
    match (chars.next(), chars.next()) {
        (Some('X' | 'x'), Some('-')) => {
            let rest = chars.as_str();
            (!rest.is_empty()).then(|| normalize(rest))
        }
        _ => None,
    }
}

/// Reject desired keys that cannot round-trip: an empty key is sent as a
/// bare prefix that no read imports, and keys equal up to case share one
/// wire name.
fn check_keys(field: &str, desired: &BTreeMap<String, String>) -> Result<(), EncodeError> {
    let invalid = |reason: String| EncodeError::InvalidProperty {
        field: field.to_string(),
        reason,
    };
    let mut seen: BTreeMap<String, &str> = BTreeMap::new();
    for key in desired.keys() {
        if key.is_empty() {
            return Err(invalid("attribute keys must not be empty".to_string()));
        }
        if let Some(other) = seen.insert(normalize(key), key.as_str()) {
            return Err(invalid(format!(
                "keys `{}` and `{}` differ only by case",
                other, key
            )));
        }
    }
    Ok(())
}

pub fn write(
    request: &mut Request,
    field: &str,
    desired: &BTreeMap<String, String>,
    prior: &BTreeMap<String, String>,
) -> Result<(), EncodeError> {
    check_keys(field, desired)?;

    // Assume every previously known key is cleared ...
    for key in prior.keys() {
        request.insert(wire_name(key), "");
    }

    let prior: BTreeMap<String, &str> = prior
        .iter()
        .map(|(k, v)| (normalize(k), v.as_str()))
        .collect();

    // ... then let the desired map overrule that
    for (key, value) in desired {
        if value.is_empty() {
            continue;
        }
        let wire = wire_name(key);
        if prior.get(&normalize(key)) == Some(&value.as_str()) {
            request.remove(&wire);
            continue;
        }
        request.insert(wire, value.as_str());
    }
    Ok(())
}

pub fn read(response: &ColumnarResponse, visibility: &Visibility) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();
    for column in response.column_names() {
        let Some(key) = column_key(column) else {
            continue;
        };
        if !visibility.admits(&key) {
            tracing::debug!(column, "not importing unmanaged attribute");
            continue;
        }
        // An empty value is the same as not being set
        let value = response.scalar(column, "");
        if !value.is_empty() {
            attributes.insert(key, value.to_string());
        }
    }
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn extra_entries(req: &Request) -> Vec<(String, String)> {
        req.iter()
            .filter(|(k, _)| k.starts_with(WIRE_PREFIX))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn write_extra(desired: &[(&str, &str)], prior: &[(&str, &str)]) -> Request {
        let mut req = Request::new("ModifyDomain");
        write(&mut req, "extra_attributes", &map(desired), &map(prior)).unwrap();
        req
    }

    #[test]
    fn removed_key_is_cleared() {
        let req = write_extra(&[], &[("FOO", "bar")]);
        assert_eq!(req.get("X-FOO"), Some(""));
    }

    #[test]
    fn unchanged_key_is_not_sent() {
        let req = write_extra(&[("FOO", "bar")], &[("FOO", "bar")]);
        assert!(!req.contains_key("X-FOO"));
    }

    #[test]
    fn equal_maps_send_nothing() {
        let attrs = [("ACCEPT-TRUSTEE-TAC", "1"), ("DE-ABUSE-CONTACT", "x@y.z")];
        let req = write_extra(&attrs, &attrs);
        assert!(extra_entries(&req).is_empty());
    }

    #[test]
    fn changed_and_added_keys_are_sent() {
        let req = write_extra(
            &[("foo", "baz"), ("new", "1"), ("blank", "")],
            &[("FOO", "bar"), ("OLD", "x")],
        );
        assert_eq!(
            extra_entries(&req),
            vec![
                ("X-FOO".to_string(), "baz".to_string()),
                ("X-NEW".to_string(), "1".to_string()),
                ("X-OLD".to_string(), "".to_string()),
            ]
        );
    }

    #[test]
    fn lowercase_key_matching_prior_is_unchanged() {
        let req = write_extra(&[("foo", "bar")], &[("FOO", "bar")]);
        assert!(extra_entries(&req).is_empty());
    }

    #[test]
    fn empty_key_is_rejected() {
        let mut req = Request::new("ModifyDomain");
        let err = write(&mut req, "extra_attributes", &map(&[("", "1")]), &map(&[])).unwrap_err();
        assert!(matches!(err, EncodeError::InvalidProperty { .. }));
        assert_eq!(req.len(), 1);
    }

    #[test]
    fn keys_differing_only_by_case_are_rejected() {
        let mut req = Request::new("ModifyDomain");
        let err = write(
            &mut req,
            "extra_attributes",
            &map(&[("foo", "1"), ("FOO", "2")]),
            &map(&[]),
        )
        .unwrap_err();
        assert!(
            matches!(&err, EncodeError::InvalidProperty { field, .. } if field == "extra_attributes"),
            "{}",
            err
        );
        assert!(extra_entries(&req).is_empty());
    }

    fn response() -> ColumnarResponse {
        ColumnarResponse::success()
            .with_column("X-FOO", ["bar"])
            .with_column("x-lower", ["yes"])
            .with_column("X-EMPTY", [""])
            .with_column("X-", ["nameless"])
            .with_column("XFOO", ["not prefixed"])
            .with_column("NAMESERVER", ["ns1.example.com"])
    }

    #[test]
    fn read_all_imports_every_prefixed_column() {
        assert_eq!(
            read(&response(), &Visibility::All),
            map(&[("FOO", "bar"), ("LOWER", "yes")])
        );
    }

    #[test]
    fn read_known_only_imports_reference_keys() {
        assert_eq!(
            read(&response(), &Visibility::known(["foo", "empty"])),
            map(&[("FOO", "bar")])
        );
    }
}
