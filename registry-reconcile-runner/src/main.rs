//! The registry-reconcile-runner executable
//!
//! Runs the reconciliation engine from the command line, without a hosting
//! lifecycle: feed it properties to see the wire request, feed it a response
//! to see the structured state, or apply an operation through a dispatcher
//! process.

use std::{io::IsTerminal as _, path::PathBuf};

use anyhow::{Context, Result};
use clap::{ColorChoice, CommandFactory, Parser, Subcommand};
use registry_reconcile::{
    decode, encode, Engine, EngineOptions, EntityKind, Operation, Payload, ResourceState,
    Visibility,
};
use registry_reconcile_runner::{
    empty_state, load_response, load_state, state_to_json, DispatcherConfig, StdioDispatcher,
};

mod logging;

fn main() -> Result<()> {
    let args = Args::parse();

    logging::set_up(&logging::Options {
        verbose: args.verbose,
        color: match args.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => std::io::stderr().is_terminal(),
        },
    })?;

    match &args.command {
        Commands::Encode {
            states,
            options,
            json,
        } => {
            let operation = states.operation;
            let (desired, prior) = states.load()?;
            let request = encode(
                operation,
                &desired,
                prior.as_ref(),
                &options.to_engine_options(),
            )
            .with_context(|| format!("Could not encode {} {}", operation, states.kind))?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&request)?);
            } else {
                print!("{}", request.to_plain());
            }
        }
        Commands::Decode {
            kind,
            response,
            import_all,
            known,
        } => {
            let response = load_response(response)?;
            let visibility = if *import_all {
                Visibility::All
            } else {
                Visibility::known(known)
            };
            let state = decode(*kind, &response, &visibility)
                .with_context(|| format!("Could not decode {} response", kind))?;
            println!("{}", state_to_json(&state)?);
        }
        Commands::Apply {
            states,
            options,
            dispatch_exe,
            dispatch_args,
        } => {
            let (desired, prior) = states.load()?;
            let dispatcher = StdioDispatcher::new(DispatcherConfig {
                executable: dispatch_exe.clone(),
                args: dispatch_args.clone(),
            });
            let engine = Engine::new(dispatcher, options.to_engine_options());
            let observed = engine
                .execute(states.operation, &desired, prior.as_ref())
                .with_context(|| format!("Could not {} {}", states.operation, states.kind))?;
            match observed {
                Some(state) => println!("{}", state_to_json(&state)?),
                None => tracing::info!("{} {} deleted", states.kind, desired_label(&desired)),
            }
        }
        Commands::GenerateMan => {
            let cmd = Args::command();
            let man = clap_mangen::Man::new(cmd);
            let mut buffer: Vec<u8> = Default::default();
            man.render(&mut buffer)?;
            println!("{}", String::from_utf8(buffer)?);
        }
        Commands::GenerateMarkdown => {
            let opts = clap_markdown::MarkdownOptions::new().show_footer(false);
            let markdown: String = clap_markdown::help_markdown_custom::<Args>(&opts);
            println!("{}", markdown);
        }
        Commands::GenerateCompletion { shell } => {
            let mut cmd = Args::command();
            clap_complete::generate(
                *shell,
                &mut cmd,
                "registry-reconcile-runner",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

fn desired_label(state: &ResourceState) -> String {
    match state.identity().payload() {
        Some(Payload::String(s)) => s.clone(),
        _ => "(unnamed)".to_string(),
    }
}

/// Run the registry reconciliation engine on properties files
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, global = true, default_value = "false")]
    verbose: bool,

    #[arg(long, global = true, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    #[command(subcommand)]
    command: Commands,
}

/// The entity and the states an operation works on
#[derive(clap::Args, Debug)]
struct StateArgs {
    /// The kind of registry object: domain, contact or nameserver
    #[arg(long)]
    kind: EntityKind,

    /// The operation: create, read, update or delete
    #[arg(long)]
    operation: Operation,

    /// JSON object with the desired properties, keyed by field name
    ///
    /// `null` marks a field as unset. Without this, every field is unset.
    #[arg(long)]
    desired: Option<PathBuf>,

    /// JSON object with the last observed properties
    #[arg(long)]
    prior: Option<PathBuf>,

    /// Mark a desired field as not known yet
    #[arg(long, value_name = "FIELD")]
    unknown: Vec<String>,
}

impl StateArgs {
    fn load(&self) -> Result<(ResourceState, Option<ResourceState>)> {
        let desired = match &self.desired {
            Some(path) => load_state(self.kind, path, &self.unknown)?,
            None => empty_state(self.kind, &self.unknown)?,
        };
        let prior = self
            .prior
            .as_ref()
            .map(|path| load_state(self.kind, path, &[]))
            .transpose()?;
        Ok((desired, prior))
    }
}

#[derive(clap::Args, Debug)]
struct OptionArgs {
    /// Allow registering and deleting domains
    #[arg(long)]
    allow_domain_create_delete: bool,

    /// Import all `X-` attributes when reading back, not only the desired ones
    #[arg(long)]
    import_all_extra_attributes: bool,
}

impl OptionArgs {
    fn to_engine_options(&self) -> EngineOptions {
        EngineOptions {
            allow_domain_create_delete: self.allow_domain_create_delete,
            import_all_extra_attributes: self.import_all_extra_attributes,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the request an operation would send
    Encode {
        #[command(flatten)]
        states: StateArgs,

        #[command(flatten)]
        options: OptionArgs,

        /// Print the request as a JSON object instead of `KEY=VALUE` lines
        #[arg(long)]
        json: bool,
    },

    /// Decode a plain `[RESPONSE]` file into JSON properties
    Decode {
        /// The kind of registry object: domain, contact or nameserver
        #[arg(long)]
        kind: EntityKind,

        /// The response file
        #[arg(long)]
        response: PathBuf,

        /// Import every `X-` attribute
        #[arg(long, conflicts_with = "known")]
        import_all: bool,

        /// Import this `X-` attribute (without prefix); may be repeated
        #[arg(long, value_name = "KEY")]
        known: Vec<String>,
    },

    /// Run an operation against a dispatcher process and print the observed state
    Apply {
        #[command(flatten)]
        states: StateArgs,

        #[command(flatten)]
        options: OptionArgs,

        /// The executable that sends requests to the registry
        ///
        /// It receives the request as `KEY=VALUE` lines on stdin and must print
        /// a plain `[RESPONSE]` on stdout.
        #[arg(long)]
        dispatch_exe: String,

        /// An argument to pass to the dispatcher; may be repeated
        #[arg(long("dispatch-arg"), value_name = "ARG", allow_hyphen_values = true)]
        dispatch_args: Vec<String>,
    },

    /// Generate markdown documentation for registry-reconcile-runner
    #[command(hide = true)]
    GenerateMarkdown,

    /// Generate a manpage for registry-reconcile-runner
    #[command(hide = true)]
    GenerateMan,

    /// Generate shell completion for registry-reconcile-runner
    #[command(hide = true)]
    GenerateCompletion {
        /// The shell to generate completion for
        #[arg(long)]
        shell: clap_complete::Shell,
    },
}
