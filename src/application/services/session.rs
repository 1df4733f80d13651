//! Editing session
//!
//! Holds the state the front end needs between commands: the current
//! selection, the kind a bare `add` creates, and aliases for generated ids.
//! The store itself never sees any of this; every call receives the
//! resolved id explicitly.

use std::collections::HashMap;

use tracing::{debug, instrument, warn};

use crate::application::command::{Command, Target};
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::{
    chance_report, expected_value, ChanceValue, DomainError, IdGenerator, NodeId, NodeKind,
    NodeStore,
};
use crate::tree_traits::{node_label, TreeNodeConvert};

/// Result of one command, for the front end to display.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Selected(Target),
    KindChosen(NodeKind),
    Created {
        id: NodeId,
        kind: NodeKind,
        parent: Option<NodeId>,
    },
    Updated(NodeId),
    Removed {
        target: Option<String>,
        count: usize,
    },
    Node(String),
    Listing(Vec<String>),
    Tree(String),
    Value {
        id: String,
        value: f64,
    },
    Chances(Vec<ChanceValue>),
    Help,
}

pub struct Session {
    store: NodeStore,
    selection: Option<Target>,
    pending_kind: NodeKind,
    aliases: HashMap<String, NodeId>,
    precision: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl Session {
    pub fn new(settings: &Settings) -> Self {
        let ids = IdGenerator::new(settings.ids.prefix.clone(), settings.ids.style);
        Self {
            store: NodeStore::with_ids(ids),
            selection: None,
            pending_kind: NodeKind::Decision,
            aliases: HashMap::new(),
            precision: settings.display.precision,
        }
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn selection(&self) -> Option<&Target> {
        self.selection.as_ref()
    }

    pub fn pending_kind(&self) -> NodeKind {
        self.pending_kind
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    pub fn alias(&self, name: &str) -> Option<&NodeId> {
        self.aliases.get(name)
    }

    /// Parse and execute one line. `Ok(None)` for blank lines and comments.
    pub fn execute_line(&mut self, line: &str) -> ApplicationResult<Option<Outcome>> {
        match Command::parse(line)? {
            Some(command) => self.execute(command).map(Some),
            None => Ok(None),
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn execute(&mut self, command: Command) -> ApplicationResult<Outcome> {
        match command {
            Command::Select(target) => self.select(target),
            Command::Kind(kind) => {
                self.pending_kind = kind;
                Ok(Outcome::KindChosen(kind))
            }
            Command::Add {
                kind,
                parent,
                alias,
            } => self.add(kind, parent, alias),
            Command::Set { node, update } => {
                let id = self.resolve(&node);
                self.store.update_node(&id, &update)?;
                Ok(Outcome::Updated(NodeId::new(id)))
            }
            Command::Remove(reference) => Ok(self.remove(reference)),
            Command::Find(reference) => {
                let id = self.resolve(&reference);
                let view = self
                    .store
                    .find(&id)
                    .ok_or_else(|| DomainError::NotFound(NodeId::new(id.clone())))?;
                Ok(Outcome::Node(node_label(&view, self.precision)))
            }
            Command::List => Ok(Outcome::Listing(self.listing())),
            Command::Tree => Ok(Outcome::Tree(
                self.store.to_tree_string(self.precision).to_string(),
            )),
            Command::Ev(reference) => {
                let id = self.resolve(&reference);
                let value = expected_value(&self.store, &id);
                Ok(Outcome::Value { id, value })
            }
            Command::Chances => Ok(Outcome::Chances(chance_report(&self.store))),
            Command::Help => Ok(Outcome::Help),
        }
    }

    fn select(&mut self, target: Target) -> ApplicationResult<Outcome> {
        let target = match target {
            Target::Root => Target::Root,
            Target::Node(reference) => {
                let id = self.resolve(&reference);
                if !self.store.contains(&id) {
                    return Err(DomainError::NotFound(NodeId::new(id)).into());
                }
                Target::Node(id)
            }
        };
        debug!("selected {}", target);
        self.selection = Some(target.clone());
        Ok(Outcome::Selected(target))
    }

    fn add(
        &mut self,
        kind: Option<NodeKind>,
        parent: Option<Target>,
        alias: Option<String>,
    ) -> ApplicationResult<Outcome> {
        let kind = kind.unwrap_or(self.pending_kind);
        let parent_id = match parent.or_else(|| self.selection.clone()) {
            None | Some(Target::Root) => None,
            Some(Target::Node(reference)) => Some(self.resolve(&reference)),
        };

        if let Some(alias) = &alias {
            self.check_alias(alias)?;
        }

        let aliases = &self.aliases;
        let id = self
            .store
            .create_node_avoiding(parent_id.as_deref(), kind, |candidate| {
                aliases.contains_key(candidate)
            })?;
        if let Some(alias) = alias {
            if let Some(previous) = self.aliases.insert(alias.clone(), id.clone()) {
                warn!("alias {} rebound from {} to {}", alias, previous, id);
            }
        }
        Ok(Outcome::Created {
            id,
            kind,
            parent: parent_id.map(NodeId::new),
        })
    }

    // Removing always clears the selection, whether or not anything was removed.
    fn remove(&mut self, reference: Option<String>) -> Outcome {
        let target = match reference {
            Some(reference) => Some(self.resolve(&reference)),
            None => match &self.selection {
                Some(Target::Node(id)) => Some(id.clone()),
                _ => None,
            },
        };

        let count = self.store.remove_node(target.as_deref());
        self.selection = None;
        let store = &self.store;
        self.aliases.retain(|_, id| store.contains(id.as_str()));

        Outcome::Removed { target, count }
    }

    fn listing(&self) -> Vec<String> {
        self.store
            .flatten()
            .iter()
            .map(|view| {
                format!(
                    "{}{}",
                    "  ".repeat(view.level().saturating_sub(1)),
                    node_label(view, self.precision)
                )
            })
            .collect()
    }

    // Aliases are resolved before ids, so one must never shadow a live id
    // or the `root` keyword.
    fn check_alias(&self, alias: &str) -> ApplicationResult<()> {
        if alias.eq_ignore_ascii_case("root") {
            return Err(ApplicationError::invalid_command(format!(
                "alias '{}' is reserved",
                alias
            )));
        }
        if self.store.contains(alias) {
            return Err(ApplicationError::invalid_command(format!(
                "alias '{}' names an existing node",
                alias
            )));
        }
        Ok(())
    }

    /// Alias lookup, falling back to the reference as a raw id.
    fn resolve(&self, reference: &str) -> String {
        self.aliases
            .get(reference)
            .map(|id| id.to_string())
            .unwrap_or_else(|| reference.to_string())
    }
}
