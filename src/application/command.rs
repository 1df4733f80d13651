//! Line-oriented command language of the session.
//!
//! One command per line. Blank lines and `#` comments are skipped.
//! Tokens split on whitespace; double quotes group words and are stripped.

use std::fmt;

use tracing::trace;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{NodeKind, NodeUpdate};

pub const HELP: &str = "\
select <ref>|root                          select a node (or the root) for add/remove
kind decision|chance|end                   kind used by a bare 'add'
add [<kind>] [under <ref>|root] [as <name>] create a node, print its id
set <ref> key=value ...                    label, note, outcome, probability|chance, payoff|value
remove [<ref>]                             remove a node and its subtree (default: selection)
find <ref>                                 show one node
list                                       all nodes in pre-order
tree                                       render the forest
ev <ref>                                   expected value of a node
chances                                    expected value of every chance node
help                                       this text";

/// Where an `add` attaches or what `select` points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Root,
    Node(String),
}

impl Target {
    fn parse(token: &str) -> Self {
        if token.eq_ignore_ascii_case("root") {
            Target::Root
        } else {
            Target::Node(token.to_string())
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Root => f.write_str("root"),
            Target::Node(reference) => f.write_str(reference),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Select(Target),
    Kind(NodeKind),
    Add {
        kind: Option<NodeKind>,
        parent: Option<Target>,
        alias: Option<String>,
    },
    Set {
        node: String,
        update: NodeUpdate,
    },
    Remove(Option<String>),
    Find(String),
    List,
    Tree,
    Ev(String),
    Chances,
    Help,
}

impl Command {
    /// Parse one line. `Ok(None)` for blank lines and comments.
    pub fn parse(line: &str) -> ApplicationResult<Option<Command>> {
        let tokens = tokenize(line)?;
        let Some((head, args)) = tokens.split_first() else {
            return Ok(None);
        };
        if head.starts_with('#') {
            return Ok(None);
        }
        trace!("parse: {} {:?}", head, args);

        let command = match head.to_ascii_lowercase().as_str() {
            "select" => Command::Select(Target::parse(single(head, args)?)),
            "kind" => Command::Kind(parse_kind(single(head, args)?)?),
            "add" => parse_add(args)?,
            "set" | "update" => parse_set(args)?,
            "remove" | "rm" => match args {
                [] => Command::Remove(None),
                [node] => Command::Remove(Some(node.clone())),
                _ => return Err(too_many(head)),
            },
            "find" => Command::Find(single(head, args)?.to_string()),
            "ev" => Command::Ev(single(head, args)?.to_string()),
            "list" => no_args(head, args, Command::List)?,
            "tree" | "show" => no_args(head, args, Command::Tree)?,
            "chances" => no_args(head, args, Command::Chances)?,
            "help" => Command::Help,
            other => {
                return Err(ApplicationError::invalid_command(format!(
                    "unknown command '{}'",
                    other
                )))
            }
        };
        Ok(Some(command))
    }
}

fn parse_add(args: &[String]) -> ApplicationResult<Command> {
    let mut kind = None;
    let mut parent = None;
    let mut alias = None;
    let mut rest = args.iter();

    while let Some(token) = rest.next() {
        match token.to_ascii_lowercase().as_str() {
            "under" => {
                let target = rest
                    .next()
                    .ok_or_else(|| ApplicationError::invalid_command("'under' needs a node"))?;
                parent = Some(Target::parse(target));
            }
            "as" => {
                let name = rest
                    .next()
                    .ok_or_else(|| ApplicationError::invalid_command("'as' needs a name"))?;
                alias = Some(name.clone());
            }
            _ if kind.is_none() => kind = Some(parse_kind(token)?),
            _ => {
                return Err(ApplicationError::invalid_command(format!(
                    "unexpected token '{}' in add",
                    token
                )))
            }
        }
    }
    Ok(Command::Add {
        kind,
        parent,
        alias,
    })
}

fn parse_set(args: &[String]) -> ApplicationResult<Command> {
    let Some((node, assignments)) = args.split_first() else {
        return Err(ApplicationError::invalid_command("set needs a node"));
    };
    if assignments.is_empty() {
        return Err(ApplicationError::invalid_command(
            "set needs at least one key=value",
        ));
    }

    let mut update = NodeUpdate::new();
    for assignment in assignments {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            ApplicationError::invalid_command(format!("expected key=value, got '{}'", assignment))
        })?;
        match key.to_ascii_lowercase().as_str() {
            "label" => update.label = Some(value.to_string()),
            "note" | "decision" => update.decision_note = Some(value.to_string()),
            "outcome" => update.outcome = Some(value.to_string()),
            "probability" | "chance" | "p" => {
                update.probability_percent = Some(parse_number(key, value)?)
            }
            "payoff" | "value" => update.payoff = Some(parse_number(key, value)?),
            other => {
                return Err(ApplicationError::invalid_command(format!(
                    "unknown field '{}'",
                    other
                )))
            }
        }
    }
    Ok(Command::Set {
        node: node.clone(),
        update,
    })
}

fn parse_kind(token: &str) -> ApplicationResult<NodeKind> {
    token.parse().map_err(ApplicationError::invalid_command)
}

fn parse_number(key: &str, value: &str) -> ApplicationResult<f64> {
    value.trim().parse::<f64>().map_err(|_| {
        ApplicationError::invalid_command(format!("{} must be a number, got '{}'", key, value))
    })
}

fn single<'a>(head: &str, args: &'a [String]) -> ApplicationResult<&'a str> {
    match args {
        [only] => Ok(only.as_str()),
        [] => Err(ApplicationError::invalid_command(format!(
            "{} needs an argument",
            head
        ))),
        _ => Err(too_many(head)),
    }
}

fn no_args(head: &str, args: &[String], command: Command) -> ApplicationResult<Command> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(too_many(head))
    }
}

fn too_many(head: &str) -> ApplicationError {
    ApplicationError::invalid_command(format!("too many arguments for {}", head))
}

fn tokenize(line: &str) -> ApplicationResult<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;

    for c in line.trim().chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                in_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_quotes {
        return Err(ApplicationError::invalid_command("unterminated quote"));
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}
