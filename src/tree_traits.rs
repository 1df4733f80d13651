//! Text projection of the forest for display.
//!
//! Renders nodes into `termtree::Tree<String>` with expected values shown on
//! Chance nodes. Read-only: nothing here touches the store.

use termtree::Tree;
use tracing::instrument;

use crate::domain::{node_value, NodeFields, NodeStore, NodeView};

pub const ROOT_LABEL: &str = "Root Node";

pub trait TreeNodeConvert {
    fn to_tree_string(&self, precision: usize) -> Tree<String>;
}

impl TreeNodeConvert for NodeView<'_> {
    fn to_tree_string(&self, precision: usize) -> Tree<String> {
        let leaves: Vec<_> = self
            .children()
            .map(|child| child.to_tree_string(precision))
            .collect();
        Tree::new(node_label(self, precision)).with_leaves(leaves)
    }
}

// All roots hang below a synthetic root, like the canvas root the nodes are
// attached to.
impl TreeNodeConvert for NodeStore {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self, precision: usize) -> Tree<String> {
        let leaves: Vec<_> = self
            .roots()
            .iter()
            .map(|root| root.to_tree_string(precision))
            .collect();
        Tree::new(ROOT_LABEL.to_string()).with_leaves(leaves)
    }
}

/// One-line description of a node.
///
/// `ID3 [chance] EV=25.00 "market"`
/// `ID4 [end] "win" p=30% payoff=200`
pub fn node_label(view: &NodeView<'_>, precision: usize) -> String {
    let id = view.id();
    match view.fields() {
        NodeFields::Decision { label } => {
            format!("{} [decision]{}", id, quoted(label))
        }
        NodeFields::Chance { decision_note } => format!(
            "{} [chance] EV={:.*}{}",
            id,
            precision,
            node_value(view),
            quoted(decision_note)
        ),
        NodeFields::End {
            outcome,
            probability_percent,
            payoff,
        } => format!(
            "{} [end]{} p={}% payoff={}",
            id,
            quoted(outcome),
            probability_percent,
            payoff
        ),
    }
}

fn quoted(text: &str) -> String {
    if text.is_empty() {
        String::new()
    } else {
        format!(" \"{}\"", text)
    }
}
