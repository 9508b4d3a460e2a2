//! Command execution.
//!
//! Commands:
//! - `read <path>` - Show the node state
//! - `save <path> -p name=value...` - Reconcile properties, writing only on difference
//! - `delete <path> [--if-exists]` - Delete a node
//! - `prop-save <path> <name> <value>` / `prop-delete <path> <name>` - Single property edits
//! - `tree <path>` - All descendants, depth first
//! - `parents <path>` - Ancestors up to the root
//!
//! Property values given on the command line are read as JSON when they
//! parse as a JSON scalar or array (`3`, `true`, `["a","b"]`, `null`) and as
//! plain strings otherwise. `null` removes the property.

use serde::Serialize;

use repotree_core::format;
use repotree_core::{Node, NodePath, OutputFormat, Properties, Transport, Value};

use crate::{CliError, Command};

/// Outcome of a mutating command.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Mutation {
    pub path: NodePath,
    pub changed: bool,
}

impl Mutation {
    fn render(&self, output: OutputFormat) -> Result<String, CliError> {
        match output {
            OutputFormat::Text => {
                let status = if self.changed { "changed" } else { "unchanged" };
                Ok(format!("path '{}' {}\n", self.path, status))
            }
            structured => structured_output(self, structured),
        }
    }
}

/// Execute one command and return what should be printed.
pub fn execute<T: Transport + ?Sized>(
    command: &Command,
    transport: &T,
    output: OutputFormat,
) -> Result<String, CliError> {
    match command {
        Command::Read { path } => {
            let node = Node::parse(transport, path)?;
            match output {
                OutputFormat::Text => Ok(format::to_text(&node)),
                structured => structured_output(&node.state()?, structured),
            }
        }
        Command::Save {
            path,
            props,
            props_json,
        } => {
            let node = Node::parse(transport, path)?;
            let desired = desired_props(props, props_json.as_deref())?;
            let changed = node.save_with_changed(&desired)?;
            mutation(&node, changed).render(output)
        }
        Command::Delete { path, if_exists } => {
            let node = Node::parse(transport, path)?;
            let changed = if *if_exists {
                node.delete_with_changed()?
            } else {
                node.delete()?;
                true
            };
            mutation(&node, changed).render(output)
        }
        Command::PropSave { path, name, value } => {
            let node = Node::parse(transport, path)?;
            let changed = node.save_with_changed(&single(name, parse_value(value)))?;
            mutation(&node, changed).render(output)
        }
        Command::PropDelete { path, name } => {
            let node = Node::parse(transport, path)?;
            let changed = node.save_with_changed(&single(name, Value::Null))?;
            mutation(&node, changed).render(output)
        }
        Command::Tree { path } => {
            let node = Node::parse(transport, path)?;
            let paths = node
                .descendants()
                .map(|n| n.map(|n| n.path().clone()))
                .collect::<Result<Vec<_>, _>>()?;
            render_paths(&paths, output)
        }
        Command::Parents { path } => {
            let node = Node::parse(transport, path)?;
            let paths: Vec<NodePath> = node.parents().map(|n| n.path().clone()).collect();
            render_paths(&paths, output)
        }
    }
}

fn mutation<T: Transport + ?Sized>(node: &Node<'_, T>, changed: bool) -> Mutation {
    Mutation {
        path: node.path().clone(),
        changed,
    }
}

fn single(name: &str, value: Value) -> Properties {
    let mut props = Properties::new();
    props.insert(name.to_string(), value);
    props
}

fn render_paths(paths: &[NodePath], output: OutputFormat) -> Result<String, CliError> {
    match output {
        OutputFormat::Text => Ok(paths.iter().map(|p| format!("{}\n", p)).collect()),
        structured => structured_output(paths, structured),
    }
}

/// JSON or YAML, always ending in exactly one newline.
fn structured_output<S: Serialize + ?Sized>(
    value: &S,
    output: OutputFormat,
) -> Result<String, CliError> {
    let encoded = format::encode(value, output)?;
    Ok(format!("{}\n", encoded.trim_end()))
}

/// Merge `--props-json` with `-p` assignments; assignments win.
fn desired_props(assignments: &[String], json: Option<&str>) -> Result<Properties, CliError> {
    let mut props = match json {
        Some(json) => parse_props_json(json)?,
        None => Properties::new(),
    };
    for assignment in assignments {
        let (name, value) = parse_assignment(assignment)?;
        props.insert(name, value);
    }
    Ok(props)
}

fn parse_props_json(json: &str) -> Result<Properties, CliError> {
    let serde_json::Value::Object(map) = serde_json::from_str(json)? else {
        return Err(CliError::InvalidProperty(
            "--props-json must be a JSON object".to_string(),
        ));
    };
    map.into_iter()
        .map(|(name, json)| match Value::from_json(json) {
            Some(value) => Ok((name, value)),
            None => Err(CliError::InvalidProperty(format!(
                "'{}' is an object; nested nodes cannot be saved as properties",
                name
            ))),
        })
        .collect()
}

fn parse_assignment(assignment: &str) -> Result<(String, Value), CliError> {
    match assignment.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), parse_value(value))),
        _ => Err(CliError::InvalidProperty(format!(
            "expected NAME=VALUE, got '{}'",
            assignment
        ))),
    }
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(Value::from_json)
        .unwrap_or_else(|| Value::from(raw))
}
