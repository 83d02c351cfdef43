use std::{
    io::{self, Read, Write},
    path::Path,
    process::{Child, Command, Stdio},
};

use anyhow::{bail, Context, Result};
use registry_reconcile::{
    ColumnarResponse, CommandDispatcher, EntityKind, Request, ResourceState,
};
use serde_json::Value;

pub struct DispatcherConfig {
    pub executable: String,
    pub args: Vec<String>,
}

/// Dispatches each request to a fresh process.
///
/// The process receives the plain request lines on stdin and must print a
/// plain `[RESPONSE]` on stdout.
pub struct StdioDispatcher {
    config: DispatcherConfig,
    // TODO: maintain a long-lived process, once the protocol has a session framing
}

impl StdioDispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        StdioDispatcher { config }
    }
}

impl CommandDispatcher for StdioDispatcher {
    fn dispatch(&self, request: &Request) -> Result<ColumnarResponse> {
        let mut process = Command::new(&self.config.executable)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| {
                format!(
                    "Could not spawn dispatcher process {}",
                    self.config.executable
                )
            })?;

        let output = match exchange(&mut process, request) {
            Ok(output) => output,
            Err(e) => {
                // Reap the child on every path; it may already be gone
                let _ = process.kill();
                let _ = process.wait();
                return Err(e);
            }
        };

        let status = process.wait()?;
        if !status.success() {
            bail!(
                "dispatcher {} exited with {} for {}",
                self.config.executable,
                status,
                request.command()
            );
        }

        ColumnarResponse::parse_plain(&output)
            .with_context(|| format!("Could not parse response to {}", request.command()))
    }
}

/// Write the request to the child's stdin, close it, and collect stdout.
fn exchange(process: &mut Child, request: &Request) -> Result<String> {
    {
        let mut child_in = process
            .stdin
            .take()
            .context("dispatcher process has no stdin")?;
        match child_in.write_all(request.to_plain().as_bytes()) {
            // A dispatcher may answer without reading the whole request
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
            result => result.context("Could not write request to dispatcher")?,
        }
        // Dropping stdin signals the end of the request
    }

    let mut output = String::new();
    process
        .stdout
        .take()
        .context("dispatcher process has no stdout")?
        .read_to_string(&mut output)
        .context("Could not read response from dispatcher")?;
    Ok(output)
}

/// Read a JSON properties file into a state, then mark `unknown` fields as
/// not determined yet.
pub fn load_state(kind: EntityKind, path: &Path, unknown: &[String]) -> Result<ResourceState> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read properties file {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("Could not parse {} as JSON", path.display()))?;
    let Value::Object(properties) = value else {
        bail!("properties file {} must contain a JSON object", path.display());
    };
    let mut state = ResourceState::from_properties(kind, &properties)
        .with_context(|| format!("Could not deserialize {} properties", kind))?;
    for field in unknown {
        state
            .mark_unknown(field)
            .with_context(|| format!("Could not mark `{}` as unknown", field))?;
    }
    Ok(state)
}

/// A state with only `unknown` fields set, for when no file was given.
pub fn empty_state(kind: EntityKind, unknown: &[String]) -> Result<ResourceState> {
    let mut state = ResourceState::new(kind);
    for field in unknown {
        state
            .mark_unknown(field)
            .with_context(|| format!("Could not mark `{}` as unknown", field))?;
    }
    Ok(state)
}

pub fn load_response(path: &Path) -> Result<ColumnarResponse> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read response file {}", path.display()))?;
    ColumnarResponse::parse_plain(&text)
        .with_context(|| format!("Could not parse response file {}", path.display()))
}

pub fn state_to_json(state: &ResourceState) -> Result<String> {
    let properties = state
        .to_properties()
        .context("Could not render the state as JSON")?;
    Ok(serde_json::to_string_pretty(&Value::Object(properties))?)
}
