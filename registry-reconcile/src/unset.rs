//! Clearing optional scalars on update.
//!
//! On `Modify*` commands the protocol reads a blank field as "leave
//! unchanged", so an optional scalar is cleared by naming it in a
//! `DELETE{n}` entry instead.

use crate::request::Request;

/// Move every candidate whose request value is `""` into a `DELETE{n}` entry.
///
/// Candidates are visited in declaration order, which only decides the
/// numbering. Candidates missing from the request or holding a value are
/// left alone.
pub fn apply(request: &mut Request, candidates: &[&str]) {
    let mut k = 0;
    for name in candidates {
        if request.get(name) != Some("") {
            continue;
        }
        request.remove(name);
        request.insert(format!("DELETE{}", k), *name);
        k += 1;
    }
}
