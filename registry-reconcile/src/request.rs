use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The request key naming the imperative command.
pub const COMMAND_KEY: &str = "COMMAND";

/// What the hosting lifecycle asks of the remote registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    /// The verb the protocol uses for this operation, e.g. `Modify` in `ModifyDomain`.
    pub fn verb(self) -> &'static str {
        match self {
            Operation::Create => "Add",
            Operation::Read => "Status",
            Operation::Update => "Modify",
            Operation::Delete => "Delete",
        }
    }

    /// Whether the request carries the entity's attributes.
    pub fn writes_attributes(self) -> bool {
        matches!(self, Operation::Create | Operation::Update)
    }

    /// Whether the operation targets an entity that was observed before.
    pub fn is_mutation(self) -> bool {
        matches!(self, Operation::Update | Operation::Delete)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(s)
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "create" => Ok(Operation::Create),
            "read" => Ok(Operation::Read),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            _ => Err(format!(
                "unknown operation `{}` (expected create, read, update or delete)",
                s
            )),
        }
    }
}

/// A flat command for the remote registry.
///
/// Keys iterate in sorted order, so a request built from the same inputs
/// always renders identically.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct Request(BTreeMap<String, String>);

impl Request {
    pub fn new(command: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(COMMAND_KEY.to_string(), command.into());
        Request(fields)
    }

    pub fn command(&self) -> &str {
        self.get(COMMAND_KEY).unwrap_or_default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of entries, including the command.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as `KEY=VALUE` lines, command first.
    ///
    /// Line breaks inside keys and values are dropped, so that every entry
    /// stays on its own line.
    pub fn to_plain(&self) -> String {
        let mut out = format!("{}={}\n", COMMAND_KEY, one_line(self.command()));
        for (k, v) in self.iter().filter(|(k, _)| *k != COMMAND_KEY) {
            out.push_str(&one_line(k));
            out.push('=');
            out.push_str(&one_line(v));
            out.push('\n');
        }
        out
    }
}

pub(crate) fn one_line(s: &str) -> String {
    s.replace(['\r', '\n'], "")
}
