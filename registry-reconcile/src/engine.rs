//! The encode-dispatch-decode cycle.
//!
//! [`encode`] and [`decode`] are pure functions of their inputs. [`Engine`]
//! strings them together around a [`CommandDispatcher`], which owns
//! transport, authentication and retries.

use tracing::{debug, info_span};

use crate::{
    entity::EntityKind,
    error::{DecodeError, EncodeError, Error, Result},
    extra::Visibility,
    request::{Operation, Request},
    response::ColumnarResponse,
    state::ResourceState,
    unset,
    value::{AttributeValue, FieldKind, Payload},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineOptions {
    /// Permit `AddDomain` and `DeleteDomain`. Off by default, so that domains
    /// are only read and modified unless explicitly requested.
    pub allow_domain_create_delete: bool,
    /// Import every `X-` attribute on read instead of only the desired ones.
    pub import_all_extra_attributes: bool,
}

impl EngineOptions {
    /// The dynamic-attribute mode for reading back `reference`.
    pub fn visibility(&self, reference: &ResourceState) -> Visibility {
        if self.import_all_extra_attributes {
            Visibility::All
        } else {
            Visibility::known(reference.extra_attribute_keys())
        }
    }
}

/// The remote command collaborator.
pub trait CommandDispatcher {
    /// Send one request and return the response, whatever its status code.
    fn dispatch(&self, request: &Request) -> anyhow::Result<ColumnarResponse>;
}

impl<D: CommandDispatcher + ?Sized> CommandDispatcher for &D {
    fn dispatch(&self, request: &Request) -> anyhow::Result<ColumnarResponse> {
        (**self).dispatch(request)
    }
}

/// The identity as a non-empty string, `None` when Absent or empty.
fn identity_value(state: &ResourceState) -> Result<Option<String>, EncodeError> {
    let field = state.kind().schema().identity.field;
    match state.identity() {
        AttributeValue::Unknown => Err(EncodeError::AmbiguousValue {
            field: field.to_string(),
        }),
        AttributeValue::Absent => Ok(None),
        AttributeValue::Present(Payload::String(s)) if s.is_empty() => Ok(None),
        AttributeValue::Present(Payload::String(s)) => Ok(Some(s.clone())),
        AttributeValue::Present(other) => Err(EncodeError::TypeMismatch {
            field: field.to_string(),
            expected: FieldKind::String,
            found: other.kind(),
        }),
    }
}

/// Build the request for `operation`.
///
/// `prior` is the last observed state; `None` is the same as an all-Absent
/// state, which is what creation always uses. Either a complete request is
/// returned or nothing is.
pub fn encode(
    operation: Operation,
    desired: &ResourceState,
    prior: Option<&ResourceState>,
    options: &EngineOptions,
) -> Result<Request, EncodeError> {
    let kind = desired.kind();
    let schema = kind.schema();
    let command = format!("{}{}", operation.verb(), kind.noun());

    if kind == EntityKind::Domain
        && matches!(operation, Operation::Create | Operation::Delete)
        && !options.allow_domain_create_delete
    {
        return Err(EncodeError::NotPermitted { command });
    }

    let empty = ResourceState::new(kind);
    let prior = match prior {
        Some(prior) if prior.kind() != kind => {
            return Err(EncodeError::KindMismatch {
                desired: kind,
                prior: prior.kind(),
            })
        }
        Some(prior) if operation != Operation::Create => prior,
        _ => &empty,
    };

    let mut request = Request::new(command);

    let identity = &schema.identity;
    match (&identity.assigned, operation) {
        (Some(assigned), Operation::Create) => {
            request.insert(assigned.marker.0, assigned.marker.1);
        }
        _ => {
            let value = identity_value(desired)?.ok_or_else(|| EncodeError::MissingIdentity {
                field: identity.field.to_string(),
            })?;
            if operation.is_mutation() {
                // An Unknown prior identity was never observed and cannot conflict
                if let Ok(Some(observed)) = identity_value(prior) {
                    if observed != value {
                        return Err(EncodeError::IdentityMismatch {
                            field: identity.field.to_string(),
                            prior: observed,
                            desired: value,
                        });
                    }
                }
            }
            request.insert(identity.wire, value);
        }
    }

    if operation.writes_attributes() {
        for field in schema.fields() {
            field.encode(&mut request, desired.get(field.name), prior.get(field.name))?;
        }
        for (key, value) in schema.constants {
            request.insert(*key, *value);
        }
        if operation == Operation::Update {
            unset::apply(&mut request, schema.unset_candidates);
        }
    }

    check_line_safe(&request)?;
    Ok(request)
}

/// Every entry must stay one `KEY=VALUE` line on the wire: no line breaks
/// anywhere, and no `=` in keys.
fn check_line_safe(request: &Request) -> Result<(), EncodeError> {
    for (key, value) in request.iter() {
        let reason = if key.contains(['\r', '\n', '=']) {
            "key contains a line break or `=`"
        } else if value.contains(['\r', '\n']) {
            "value contains a line break"
        } else {
            continue;
        };
        return Err(EncodeError::InvalidProperty {
            field: key.to_string(),
            reason: reason.to_string(),
        });
    }
    Ok(())
}

/// Rebuild the state of a `kind` entity from a Status response.
///
/// The identity column is required. Either every field decodes or an error
/// is returned.
pub fn decode(
    kind: EntityKind,
    response: &ColumnarResponse,
    visibility: &Visibility,
) -> Result<ResourceState, DecodeError> {
    let schema = kind.schema();
    let column = schema.identity.column;
    let identity = response.scalar(column, "");
    if identity.is_empty() {
        return Err(DecodeError::MissingColumn {
            column: column.to_string(),
        });
    }

    let mut state = ResourceState::new(kind);
    let mut values = vec![(schema.identity.field, AttributeValue::string(identity))];
    for field in schema.fields() {
        values.push((field.name, field.decode(response, visibility)?));
    }
    for (name, value) in values {
        state.set(name, value).map_err(|e| {
            DecodeError::MalformedResponse(format!("cannot store decoded `{}`: {}", name, e))
        })?;
    }
    Ok(state)
}

/// Runs operations against a registry through a [`CommandDispatcher`].
#[derive(Debug, Clone)]
pub struct Engine<D> {
    dispatcher: D,
    options: EngineOptions,
}

impl<D: CommandDispatcher> Engine<D> {
    pub fn new(dispatcher: D, options: EngineOptions) -> Self {
        Engine {
            dispatcher,
            options,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Dispatch one request; any non-success status is an error.
    fn run(&self, request: &Request) -> Result<ColumnarResponse> {
        let command = request.command().to_string();
        debug!(command = %command, entries = request.len(), "dispatching");
        let response = self
            .dispatcher
            .dispatch(request)
            .map_err(|e| Error::Dispatch {
                command: command.clone(),
                source: e.into(),
            })?;
        debug!(
            command = %command,
            code = response.code,
            columns = response.columns.len(),
            "received response"
        );
        if !response.is_success() {
            return Err(Error::Remote {
                command,
                code: response.code,
                description: response.description,
            });
        }
        Ok(response)
    }

    /// Run one operation. Everything but a delete ends with a Status read,
    /// whose decoded state is returned.
    pub fn execute(
        &self,
        operation: Operation,
        desired: &ResourceState,
        prior: Option<&ResourceState>,
    ) -> Result<Option<ResourceState>> {
        let kind = desired.kind();
        let span = info_span!("registry operation", %kind, %operation);
        let _enter = span.enter();

        let request = encode(operation, desired, prior, &self.options)?;
        let response = self.run(&request)?;

        match operation {
            Operation::Delete => Ok(None),
            Operation::Read => {
                let visibility = self.options.visibility(desired);
                Ok(Some(decode(kind, &response, &visibility)?))
            }
            Operation::Create | Operation::Update => {
                let mut target = desired.clone();
                if let (Operation::Create, Some(assigned)) =
                    (operation, &kind.schema().identity.assigned)
                {
                    let id = response.scalar(assigned.column, "");
                    if id.is_empty() {
                        return Err(DecodeError::MissingColumn {
                            column: assigned.column.to_string(),
                        }
                        .into());
                    }
                    debug!(%kind, "registry assigned a new identity");
                    target.set(kind.schema().identity.field, AttributeValue::string(id))?;
                }
                self.execute(Operation::Read, &target, None)
            }
        }
    }

    pub fn create(&self, desired: &ResourceState) -> Result<ResourceState> {
        self.observe(Operation::Create, desired, None)
    }

    pub fn read(&self, desired: &ResourceState) -> Result<ResourceState> {
        self.observe(Operation::Read, desired, None)
    }

    pub fn update(&self, desired: &ResourceState, prior: &ResourceState) -> Result<ResourceState> {
        self.observe(Operation::Update, desired, Some(prior))
    }

    pub fn delete(&self, prior: &ResourceState) -> Result<()> {
        self.execute(Operation::Delete, prior, Some(prior))?;
        Ok(())
    }

    fn observe(
        &self,
        operation: Operation,
        desired: &ResourceState,
        prior: Option<&ResourceState>,
    ) -> Result<ResourceState> {
        self.execute(operation, desired, prior)?.ok_or_else(|| {
            DecodeError::MalformedResponse(format!("{} produced no state", operation)).into()
        })
    }
}
