//! The command evaluation boundary.
//!
//! `{...}` spans in a document are handed to an [`Evaluator`] at render time.
//! The renderer never lets an evaluation error escape: a failing command is
//! logged and rendered as the error's message.
//!
//! [`CommandTable`] is the built-in evaluator. Expressions take the form
//! `name` or `name:arg1,arg2`; the name selects a registered command, or
//! failing that a scalar from the [`Context`].

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::error::EvalError;
use crate::render::Primitive;

/// The result of evaluating a command span.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluated {
    Text(String),
    /// Structured content spliced into the primitive stream.
    Fragment(Vec<Primitive>),
}

/// Layered lookup: an override mapping consulted first, then a base mapping.
///
/// Neither layer is ever written to; a context is a pair of borrows.
#[derive(Debug, Clone, Copy, Default)]
pub struct Context<'a> {
    base: Option<&'a Map<String, Value>>,
    overrides: Option<&'a Map<String, Value>>,
}

impl<'a> Context<'a> {
    pub fn new(
        base: Option<&'a Map<String, Value>>,
        overrides: Option<&'a Map<String, Value>>,
    ) -> Self {
        Self { base, overrides }
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.overrides
            .and_then(|layer| layer.get(key))
            .or_else(|| self.base.and_then(|layer| layer.get(key)))
    }

    /// A string, number or boolean value rendered as text.
    pub fn scalar(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

pub trait Evaluator {
    fn evaluate(&self, context: &Context<'_>, expression: &str) -> Result<Evaluated, EvalError>;
}

/// A callable command: receives the context and the comma-separated
/// arguments, returns content or a failure message.
pub type CommandFn =
    Box<dyn Fn(&Context<'_>, &[&str]) -> Result<Evaluated, String> + Send + Sync>;

pub enum Command {
    Text(String),
    Function(CommandFn),
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Command::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Named commands, with context lookup as the fallback.
#[derive(Debug, Default)]
pub struct CommandTable {
    commands: HashMap<String, Command>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, command: Command) {
        self.commands.insert(name.into(), command);
    }

    /// Register a command that always expands to `text`.
    pub fn with_text(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, Command::Text(text.into()));
        self
    }

    pub fn with_function<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&Context<'_>, &[&str]) -> Result<Evaluated, String> + Send + Sync + 'static,
    {
        self.insert(name, Command::Function(Box::new(function)));
        self
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Split `name:a,b` into its name and arguments.
fn split_expression(expression: &str) -> (&str, Vec<&str>) {
    match expression.split_once(':') {
        Some((name, args)) => (name.trim(), args.split(',').collect()),
        None => (expression.trim(), Vec::new()),
    }
}

impl Evaluator for CommandTable {
    fn evaluate(&self, context: &Context<'_>, expression: &str) -> Result<Evaluated, EvalError> {
        let (name, args) = split_expression(expression);
        match self.commands.get(name) {
            Some(Command::Text(text)) => Ok(Evaluated::Text(text.clone())),
            Some(Command::Function(function)) => {
                function(context, &args).map_err(|message| EvalError::Failed {
                    name: name.to_string(),
                    message,
                })
            }
            None => context
                .scalar(name)
                .map(Evaluated::Text)
                .ok_or_else(|| EvalError::UnknownCommand(name.to_string())),
        }
    }
}
