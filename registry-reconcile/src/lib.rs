//! Attribute reconciliation between declarative registry objects and a flat
//! key/value command protocol.
//!
//! Callers describe domains, contacts and name servers as [`ResourceState`]s
//! whose fields may be Unknown, Absent or Present. [`encode`] turns a desired
//! state and the last observed one into a [`Request`]; [`decode`] turns a
//! [`ColumnarResponse`] back into a state. [`Engine`] runs whole operations
//! through a [`CommandDispatcher`].

pub mod collection;
pub mod engine;
pub mod entity;
pub mod error;
pub mod extra;
pub mod request;
pub mod response;
pub mod state;
pub mod unset;
pub mod value;

pub use engine::{decode, encode, CommandDispatcher, Engine, EngineOptions};
pub use entity::EntityKind;
pub use error::{DecodeError, EncodeError, Error, Result};
pub use extra::Visibility;
pub use request::{Operation, Request};
pub use response::ColumnarResponse;
pub use state::ResourceState;
pub use value::{AttributeValue, FieldKind, Payload};
