//! Node entities: ids, kinds and the kind-specific scalar fields

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque node identifier, unique across the whole forest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Kind of a node. Closed set, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Decision,
    Chance,
    End,
}

impl NodeKind {
    /// End nodes are structural leaves.
    pub fn accepts_children(self) -> bool {
        !matches!(self, NodeKind::End)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Decision => "decision",
            NodeKind::Chance => "chance",
            NodeKind::End => "end",
        };
        f.write_str(name)
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "decision" | "decisionnode" | "d" => Ok(NodeKind::Decision),
            "chance" | "chancenode" | "c" => Ok(NodeKind::Chance),
            "end" | "endnode" | "e" => Ok(NodeKind::End),
            other => Err(format!("unknown node kind: {}", other)),
        }
    }
}

/// Kind-specific scalar fields. The variant tag is the node's kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeFields {
    Decision {
        label: String,
    },
    Chance {
        decision_note: String,
    },
    End {
        outcome: String,
        probability_percent: f64,
        payoff: f64,
    },
}

impl NodeFields {
    /// Neutral defaults for a freshly created node.
    pub fn neutral(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Decision => NodeFields::Decision {
                label: String::new(),
            },
            NodeKind::Chance => NodeFields::Chance {
                decision_note: String::new(),
            },
            NodeKind::End => NodeFields::End {
                outcome: String::new(),
                probability_percent: 0.0,
                payoff: 0.0,
            },
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeFields::Decision { .. } => NodeKind::Decision,
            NodeFields::Chance { .. } => NodeKind::Chance,
            NodeFields::End { .. } => NodeKind::End,
        }
    }

    /// Apply the parts of `update` that belong to this kind.
    ///
    /// Returns true if any field changed.
    pub fn apply(&mut self, update: &NodeUpdate) -> bool {
        let mut changed = false;
        match self {
            NodeFields::Decision { label } => {
                changed |= assign(label, &update.label);
            }
            NodeFields::Chance { decision_note } => {
                changed |= assign(decision_note, &update.decision_note);
            }
            NodeFields::End {
                outcome,
                probability_percent,
                payoff,
            } => {
                changed |= assign(outcome, &update.outcome);
                changed |= assign(probability_percent, &update.probability_percent);
                changed |= assign(payoff, &update.payoff);
            }
        }
        changed
    }
}

fn assign<T: Clone + PartialEq>(slot: &mut T, value: &Option<T>) -> bool {
    match value {
        Some(v) if slot != v => {
            *slot = v.clone();
            true
        }
        _ => false,
    }
}

/// Partial field set for `NodeStore::update_node`.
///
/// Fields that do not belong to the target node's kind are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeUpdate {
    pub label: Option<String>,
    pub decision_note: Option<String>,
    pub outcome: Option<String>,
    pub probability_percent: Option<f64>,
    pub payoff: Option<f64>,
}

impl NodeUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn decision_note(mut self, note: impl Into<String>) -> Self {
        self.decision_note = Some(note.into());
        self
    }

    pub fn outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcome = Some(outcome.into());
        self
    }

    pub fn probability_percent(mut self, probability_percent: f64) -> Self {
        self.probability_percent = Some(probability_percent);
        self
    }

    pub fn payoff(mut self, payoff: f64) -> Self {
        self.payoff = Some(payoff);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str_accepts_original_names() {
        assert_eq!("DecisionNode".parse::<NodeKind>(), Ok(NodeKind::Decision));
        assert_eq!("chance".parse::<NodeKind>(), Ok(NodeKind::Chance));
        assert_eq!("E".parse::<NodeKind>(), Ok(NodeKind::End));
        assert!("leaf".parse::<NodeKind>().is_err());
    }

    #[test]
    fn test_apply_ignores_fields_of_other_kinds() {
        let mut fields = NodeFields::neutral(NodeKind::End);
        let changed = fields.apply(&NodeUpdate::new().label("ignored"));
        assert!(!changed);
        assert_eq!(fields, NodeFields::neutral(NodeKind::End));
    }

    #[test]
    fn test_apply_reports_only_real_changes() {
        let mut fields = NodeFields::neutral(NodeKind::End);
        assert!(fields.apply(&NodeUpdate::new().payoff(10.0)));
        assert!(!fields.apply(&NodeUpdate::new().payoff(10.0)));
    }
}
