//! Error taxonomy of the reconciliation engine.
//!
//! Encoding and decoding are all-or-nothing: any of these errors aborts the
//! whole operation, and no partially built request or state is returned.

use thiserror::Error;

use crate::{entity::EntityKind, value::FieldKind};

/// Result type alias for engine operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure to turn desired (and prior) state into a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// An Unknown value reached the encoder
    #[error("value of `{field}` is not known yet; all values must be known or null before they are sent")]
    AmbiguousValue { field: String },

    /// The identity field changed between the observed and the desired state
    #[error("identity `{field}` changed from {prior:?} to {desired:?}")]
    IdentityMismatch {
        field: String,
        prior: String,
        desired: String,
    },

    /// The identity field is null or empty where the operation needs it
    #[error("identity `{field}` is null or empty")]
    MissingIdentity { field: String },

    #[error("`{field}` holds a {found} value, expected {expected}")]
    TypeMismatch {
        field: String,
        expected: FieldKind,
        found: FieldKind,
    },

    #[error("`{field}` accepts at most {max} values, got {count}")]
    TooManyValues {
        field: String,
        max: usize,
        count: usize,
    },

    #[error("{kind} has no field `{field}`")]
    UnknownField { kind: EntityKind, field: String },

    #[error("invalid value for `{field}`: {reason}")]
    InvalidProperty { field: String, reason: String },

    #[error("prior state is a {prior}, but the desired state is a {desired}")]
    KindMismatch {
        desired: EntityKind,
        prior: EntityKind,
    },

    /// Domain registration and deletion are disabled unless explicitly enabled
    #[error("{command} is not permitted; enable domain create/delete to send it")]
    NotPermitted { command: String },
}

/// Failure to rebuild structured state from a response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("column `{column}` holds {value:?}, which is not an integer")]
    InvalidInteger { column: String, value: String },

    #[error("response has no value in the required `{column}` column")]
    MissingColumn { column: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Any failure of an encode-dispatch-decode cycle.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The remote collaborator answered with a non-success status
    #[error("error {code} in {command}: {description}")]
    Remote {
        command: String,
        code: u32,
        description: String,
    },

    /// The remote collaborator could not be reached or produced no response
    #[error("could not dispatch {command}")]
    Dispatch {
        command: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}
