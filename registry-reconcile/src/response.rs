//! Columnar responses and the primitive decoding operations on them.
//!
//! A response maps column names to ordered arrays of strings. A column is
//! either a true collection (one element per item) or a fixed-size tuple
//! packed by position, such as the two address lines in `STREET`.

use std::collections::BTreeMap;

use crate::{error::DecodeError, request::one_line};

/// Property indices beyond this are rejected when parsing, rather than
/// allocating a huge, mostly empty column.
const MAX_PROPERTY_INDEX: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct ColumnarResponse {
    pub code: u32,
    pub description: String,
    pub columns: BTreeMap<String, Vec<String>>,
}

impl ColumnarResponse {
    pub fn new(code: u32, description: impl Into<String>) -> Self {
        ColumnarResponse {
            code,
            description: description.into(),
            columns: BTreeMap::new(),
        }
    }

    pub fn success() -> Self {
        Self::new(200, "Command completed successfully")
    }

    pub fn with_column<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// First element of the column, or `default` when missing or empty.
    pub fn scalar<'a>(&'a self, column: &str, default: &'a str) -> &'a str {
        self.indexed(column, 0, default)
    }

    /// Element at `index`, or `default` when out of range.
    pub fn indexed<'a>(&'a self, column: &str, index: usize, default: &'a str) -> &'a str {
        self.column(column)
            .and_then(|data| data.get(index))
            .map(String::as_str)
            .unwrap_or(default)
    }

    /// The whole column, in response order; empty when missing.
    pub fn vector(&self, column: &str) -> &[String] {
        self.column(column).unwrap_or_default()
    }

    /// `"1"` is true; anything else, including absence, is false.
    pub fn boolean_flag(&self, column: &str) -> bool {
        self.scalar(column, "0") == "1"
    }

    /// The scalar parsed as an integer; empty or missing yields `default`.
    pub fn integer(&self, column: &str, default: i64) -> Result<i64, DecodeError> {
        let raw = self.scalar(column, "");
        if raw.is_empty() {
            return Ok(default);
        }
        raw.trim()
            .parse::<i64>()
            .map_err(|_| DecodeError::InvalidInteger {
                column: column.to_string(),
                value: raw.to_string(),
            })
    }

    /// Parse the plain `[RESPONSE]` format.
    ///
    /// ```text
    /// [RESPONSE]
    /// CODE=200
    /// DESCRIPTION=Command completed successfully
    /// PROPERTY[NAMESERVER][0]=ns1.example.com
    /// EOF
    /// ```
    pub fn parse_plain(text: &str) -> Result<Self, DecodeError> {
        let mut code = None;
        let mut description = String::new();
        let mut columns: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed == "[RESPONSE]" || trimmed == "EOF" {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| {
                DecodeError::MalformedResponse(format!("line without `=`: {:?}", line))
            })?;
            let key = key.trim();
            let upper = key.to_ascii_uppercase();

            if upper == "CODE" {
                let parsed = value.trim().parse::<u32>().map_err(|_| {
                    DecodeError::MalformedResponse(format!("non-numeric code {:?}", value))
                })?;
                code = Some(parsed);
            } else if upper == "DESCRIPTION" {
                description = value.to_string();
            } else if upper.starts_with("PROPERTY[") {
                let (name, index) = parse_property_key(key)?;
                let column = columns.entry(name.to_string()).or_default();
                if column.len() <= index {
                    column.resize(index + 1, String::new());
                }
                column[index] = value.to_string();
            }
            // RUNTIME, QUEUETIME and other header lines carry nothing we decode
        }

        let code = code.ok_or_else(|| DecodeError::MalformedResponse("no CODE line".to_string()))?;
        Ok(ColumnarResponse {
            code,
            description,
            columns,
        })
    }

    /// Render in the plain `[RESPONSE]` format accepted by [`Self::parse_plain`].
    pub fn to_plain(&self) -> String {
        let mut out = format!(
            "[RESPONSE]\nCODE={}\nDESCRIPTION={}\n",
            self.code,
            one_line(&self.description)
        );
        for (name, values) in &self.columns {
            for (i, v) in values.iter().enumerate() {
                out.push_str(&format!(
                    "PROPERTY[{}][{}]={}\n",
                    one_line(name),
                    i,
                    one_line(v)
                ));
            }
        }
        out.push_str("EOF\n");
        out
    }
}

/// Split `PROPERTY[NAME][INDEX]` into its name and index.
fn parse_property_key(key: &str) -> Result<(&str, usize), DecodeError> {
    let malformed = || DecodeError::MalformedResponse(format!("bad property key {:?}", key));
    let rest = key
        .get("PROPERTY[".len()..)
        .and_then(|r| r.strip_suffix(']'))
        .ok_or_else(malformed)?;
    let (name, index) = rest.rsplit_once("][").ok_or_else(malformed)?;
    if name.is_empty() {
        return Err(malformed());
    }
    let index = index.parse::<usize>().map_err(|_| malformed())?;
    if index > MAX_PROPERTY_INDEX {
        return Err(DecodeError::MalformedResponse(format!(
            "property index {} out of range in {:?}",
            index, key
        )));
    }
    Ok((name, index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact_response() -> ColumnarResponse {
        ColumnarResponse::success()
            .with_column("STREET", ["123 Main St", "Suite 2"])
            .with_column("DISCLOSE", ["1"])
            .with_column("SECDNS-MAXSIGLIFE", ["3600"])
            .with_column("EMPTY", Vec::<String>::new())
    }

    #[test]
    fn indexed_reads_packed_tuple() {
        let resp = contact_response();
        assert_eq!(resp.indexed("STREET", 0, ""), "123 Main St");
        assert_eq!(resp.indexed("STREET", 1, ""), "Suite 2");
        assert_eq!(resp.indexed("STREET", 2, "none"), "none");
        assert_eq!(resp.indexed("MISSING", 0, "none"), "none");
    }

    #[test]
    fn scalar_defaults_on_missing_or_empty() {
        let resp = contact_response();
        assert_eq!(resp.scalar("STREET", ""), "123 Main St");
        assert_eq!(resp.scalar("EMPTY", "d"), "d");
        assert_eq!(resp.scalar("MISSING", "d"), "d");
    }

    #[test]
    fn vector_preserves_order() {
        let lines = ["b", "a", "c"];
        let resp = ColumnarResponse::success().with_column("WHOIS-BANNER", lines);
        assert_eq!(resp.vector("WHOIS-BANNER"), &lines);
        assert!(resp.vector("MISSING").is_empty());
    }

    #[test]
    fn boolean_flag_only_accepts_one() {
        let resp = contact_response().with_column("LOCK", ["true"]);
        assert!(resp.boolean_flag("DISCLOSE"));
        assert!(!resp.boolean_flag("LOCK"));
        assert!(!resp.boolean_flag("MISSING"));
    }

    #[test]
    fn integer_parses_or_fails_hard() {
        let resp = contact_response().with_column("BAD", ["soon"]);
        assert_eq!(resp.integer("SECDNS-MAXSIGLIFE", 0).unwrap(), 3600);
        assert_eq!(resp.integer("MISSING", 5).unwrap(), 5);
        assert_eq!(resp.integer("EMPTY", 5).unwrap(), 5);
        assert_eq!(
            resp.integer("BAD", 0).unwrap_err(),
            DecodeError::InvalidInteger {
                column: "BAD".to_string(),
                value: "soon".to_string(),
            }
        );
    }

    #[test]
    fn parse_plain_response() {
        let text = "[RESPONSE]\r\ncode = 200\r\ndescription=Command completed successfully\r\nruntime=0.02\r\nPROPERTY[NAMESERVER][1]=ns2.example.com\r\nPROPERTY[NAMESERVER][0]=ns1.example.com\r\nPROPERTY[X-FOO][0]=a=b\r\nEOF\r\n";
        let resp = ColumnarResponse::parse_plain(text).unwrap();
        assert_eq!(resp.code, 200);
        assert_eq!(resp.description, "Command completed successfully");
        assert_eq!(
            resp.vector("NAMESERVER"),
            &["ns1.example.com", "ns2.example.com"]
        );
        assert_eq!(resp.scalar("X-FOO", ""), "a=b");
        assert!(resp.is_success());
    }

    #[test]
    fn parse_plain_fills_gaps() {
        let resp =
            ColumnarResponse::parse_plain("CODE=200\nPROPERTY[STREET][1]=Suite 2\n").unwrap();
        assert_eq!(resp.vector("STREET"), &["", "Suite 2"]);
    }

    #[test]
    fn parse_plain_rejects_malformed() {
        assert!(matches!(
            ColumnarResponse::parse_plain("[RESPONSE]\nDESCRIPTION=x\nEOF\n"),
            Err(DecodeError::MalformedResponse(_))
        ));
        assert!(matches!(
            ColumnarResponse::parse_plain("CODE=abc\n"),
            Err(DecodeError::MalformedResponse(_))
        ));
        assert!(matches!(
            ColumnarResponse::parse_plain("CODE=200\nPROPERTY[STREET]=x\n"),
            Err(DecodeError::MalformedResponse(_))
        ));
        assert!(matches!(
            ColumnarResponse::parse_plain("CODE=200\ngarbage\n"),
            Err(DecodeError::MalformedResponse(_))
        ));
        assert!(matches!(
            ColumnarResponse::parse_plain("CODE=200\nPROPERTY[STREET][99999999]=x\n"),
            Err(DecodeError::MalformedResponse(_))
        ));
    }

    #[test]
    fn error_status() {
        let resp = ColumnarResponse::parse_plain(
            "[RESPONSE]\nCODE=545\nDESCRIPTION=Object not found\nEOF\n",
        )
        .unwrap();
        assert!(!resp.is_success());
        assert_eq!(resp.description, "Object not found");
    }

    #[test]
    fn plain_rendering_drops_line_breaks() {
        let resp = ColumnarResponse::new(200, "ok\nCODE=545")
            .with_column("ID", ["example.com\r\nPROPERTY[X-FOO][0]=bar"]);
        let reparsed = ColumnarResponse::parse_plain(&resp.to_plain()).unwrap();
        assert_eq!(reparsed.code, 200);
        assert_eq!(reparsed.description, "okCODE=545");
        assert_eq!(reparsed.column_names().collect::<Vec<_>>(), vec!["ID"]);
    }

    #[test]
    fn plain_rendering_parses_back() {
        let resp = contact_response();
        let reparsed = ColumnarResponse::parse_plain(&resp.to_plain()).unwrap();
        assert_eq!(reparsed.vector("STREET"), resp.vector("STREET"));
        assert_eq!(reparsed.code, 200);
    }
}
