//! Interactive console commands.
//!
//! # Responsibilities
//! - Parse one command line into a [`Command`]
//! - Execute it against the dispatcher and the field store
//! - Format replies as plain text for stdout
//!
//! # Commands
//! ```text
//! services                  list services and their call counts
//! calls <service>           list the calls of a service
//! call <service> <label>    run a call and wait for it
//! spawn <service> <label>   run a call in the background
//! set <field> <value...>    write a field
//! get <field>               read a field
//! fields                    list every field
//! show <surface>            markup and interactions of a surface
//! click <id>                activate an interaction
//! clear-aggregate           reset the aggregate-signature form
//! save                      persist field values
//! quit                      leave the console
//! ```

use std::fmt::Write as _;
use std::sync::Arc;

use thiserror::Error;

use crate::dispatch::{Completion, DispatchError, Dispatcher};
use crate::fields::{FieldStore, MemoryFieldStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Services,
    Calls(String),
    Call { service: String, label: String },
    Spawn { service: String, label: String },
    Set { field: String, value: String },
    Get(String),
    Fields,
    Show(String),
    Click(usize),
    ClearAggregate,
    Save,
    Help,
    Quit,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Unknown command '{0}', try 'help'")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Field '{0}' does not exist")]
    NoSuchField(String),

    #[error("Failed to save fields: {0}")]
    Save(#[from] std::io::Error),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl Command {
    /// Parse a command line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        let Some((word, rest)) = split_word(line) else {
            return Ok(None);
        };

        let command = match word {
            "services" => Command::Services,
            "calls" => Command::Calls(one_arg(rest, "calls <service>")?),
            "call" => {
                let (service, label) = two_args(rest, "call <service> <label>")?;
                Command::Call { service, label }
            }
            "spawn" => {
                let (service, label) = two_args(rest, "spawn <service> <label>")?;
                Command::Spawn { service, label }
            }
            "set" => {
                let (field, value) = split_word(rest).ok_or(CommandError::Usage("set <field> <value>"))?;
                Command::Set {
                    field: field.to_string(),
                    value: value.to_string(),
                }
            }
            "get" => Command::Get(one_arg(rest, "get <field>")?),
            "fields" => Command::Fields,
            "show" => Command::Show(one_arg(rest, "show <surface>")?),
            "click" => {
                let id = one_arg(rest, "click <id>")?;
                Command::Click(id.parse().map_err(|_| CommandError::Usage("click <id>"))?)
            }
            "clear-aggregate" => Command::ClearAggregate,
            "save" => Command::Save,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn split_word(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    if text.is_empty() {
        return None;
    }
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => Some((word, rest.trim())),
        None => Some((text, "")),
    }
}

fn one_arg(rest: &str, usage: &'static str) -> Result<String, CommandError> {
    match split_word(rest) {
        Some((arg, "")) => Ok(arg.to_string()),
        _ => Err(CommandError::Usage(usage)),
    }
}

fn two_args(rest: &str, usage: &'static str) -> Result<(String, String), CommandError> {
    let (first, rest) = split_word(rest).ok_or(CommandError::Usage(usage))?;
    Ok((first.to_string(), one_arg(rest, usage)?))
}

/// A console session over one dispatcher and its store.
pub struct Session {
    dispatcher: Dispatcher,
    store: Arc<MemoryFieldStore>,
}

impl Session {
    pub fn new(dispatcher: Dispatcher, store: Arc<MemoryFieldStore>) -> Self {
        Self { dispatcher, store }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Execute `command` and return the text to print.
    pub async fn execute(&self, command: Command) -> Result<String, CommandError> {
        let mut out = String::new();
        match command {
            Command::Services => {
                for (name, service) in self.dispatcher.services() {
                    let _ = writeln!(out, "{name} ({} calls)", service.registry.len());
                }
            }
            Command::Calls(name) => {
                let service = self.dispatcher.service(&name)?;
                for label in service.registry.labels() {
                    let _ = writeln!(out, "{label}");
                }
            }
            Command::Call { service, label } => {
                let completion = self.dispatcher.invoke(&service, &label).await?;
                self.describe(&mut out, &completion);
            }
            Command::Spawn { service, label } => {
                // Validate before detaching so typos are reported here.
                let known = self.dispatcher.service(&service)?;
                if known.bindings.get(&label).is_none() {
                    known.registry.lookup(&label).map_err(DispatchError::from)?;
                }
                let handle = self.dispatcher.spawn_invoke(&service, &label);
                tokio::spawn(async move {
                    match handle.await {
                        Ok(Ok(completion)) => {
                            tracing::info!(call = %completion.call, ok = completion.is_success(), "Background call finished")
                        }
                        Ok(Err(e)) => tracing::warn!(error = %e, "Background call failed"),
                        Err(e) => tracing::error!(error = %e, "Background call panicked"),
                    }
                });
                let _ = writeln!(out, "{service}.{label} started");
            }
            Command::Set { field, value } => {
                self.store.set(&field, &value);
            }
            Command::Get(field) => {
                let value = self.store.get(&field).ok_or(CommandError::NoSuchField(field))?;
                let _ = writeln!(out, "{value}");
            }
            Command::Fields => {
                for (id, value) in self.store.snapshot() {
                    let _ = writeln!(out, "{id} = {value}");
                }
            }
            Command::Show(surface) => {
                let markup = self
                    .store
                    .markup(&surface)
                    .ok_or_else(|| CommandError::NoSuchField(surface.clone()))?;
                let _ = writeln!(out, "{markup}");
                for interaction in self.dispatcher.interactions(&surface) {
                    let _ = write!(out, "[{}] {} = {}", interaction.id, interaction.path_string(), interaction.value);
                    if let Some(trigger) = &interaction.trigger {
                        let _ = write!(out, " -> {trigger}");
                    }
                    if let Some(tooltip) = &interaction.tooltip {
                        let _ = write!(out, " ({tooltip})");
                    }
                    out.push('\n');
                }
            }
            Command::Click(id) => match self.dispatcher.activate(id).await? {
                Some(completion) => self.describe(&mut out, &completion),
                None => {
                    let _ = writeln!(out, "Interaction {id} applied");
                }
            },
            Command::ClearAggregate => self.dispatcher.clear_aggregate(),
            Command::Save => {
                self.store.save_to_file()?;
                let _ = writeln!(out, "Saved {} fields", self.store.len());
            }
            Command::Help => {
                out.push_str(HELP);
            }
            Command::Quit => {}
        }
        Ok(out)
    }

    fn describe(&self, out: &mut String, completion: &Completion) {
        let surface = self
            .dispatcher
            .service(&completion.call.service)
            .map(|s| s.bindings.get_or_default(&completion.call.label).surface)
            .ok();
        if let Some(markup) = surface.as_deref().and_then(|s| self.store.markup(s)) {
            let _ = writeln!(out, "{markup}");
        }
        for instance in &completion.instances {
            match &instance.result {
                Ok(handled) => {
                    let _ = write!(out, "{}: ok", instance.url);
                    if let Some(error) = &handled.backend_error {
                        let _ = write!(out, ", backend error: {error}");
                    }
                    if !handled.interaction_ids.is_empty() {
                        let _ = write!(out, ", interactions {:?}", handled.interaction_ids);
                    }
                    if let Some(recovery) = &handled.recovery {
                        let _ = write!(out, ", recovery: {recovery:?}");
                    }
                    out.push('\n');
                }
                Err(e) => {
                    let _ = writeln!(out, "{}: {e}", instance.url);
                }
            }
        }
    }
}

const HELP: &str = "\
services | calls <service> | call <service> <label> | spawn <service> <label>
set <field> <value> | get <field> | fields | show <surface> | click <id>
clear-aggregate | save | quit
";
