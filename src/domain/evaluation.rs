//! Expected value of Chance nodes
//!
//! A Chance node's expected value is the probability-weighted sum of the
//! payoffs of its End-node children:
//!
//! ```text
//! EV(c) = Σ payoff(e) × probability_percent(e) / 100    for each End child e
//! ```
//!
//! Probabilities are used as given; they need not sum to 100. Children of
//! other kinds contribute nothing, nested Chance/Decision subtrees are not
//! resolved into a value. Evaluation never fails: anything that is not a
//! Chance node evaluates to 0.

use serde::Serialize;
use tracing::{instrument, trace};

use crate::domain::node::{NodeFields, NodeId, NodeKind};
use crate::domain::store::{NodeStore, NodeView};

/// Expected value of one Chance node, as listed by `chance_report`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChanceValue {
    pub id: NodeId,
    pub level: usize,
    pub expected_value: f64,
}

/// Expected value of the node `id`; 0 for unknown ids and non-Chance nodes.
#[instrument(level = "trace", skip(store))]
pub fn expected_value(store: &NodeStore, id: &str) -> f64 {
    store.find(id).map(|view| node_value(&view)).unwrap_or(0.0)
}

/// Expected value computed from a view.
pub fn node_value(view: &NodeView<'_>) -> f64 {
    if view.kind() != NodeKind::Chance {
        return 0.0;
    }
    let total: f64 = view
        .children()
        .filter_map(|child| match child.fields() {
            NodeFields::End {
                probability_percent,
                payoff,
                ..
            } => Some(finite_or_zero(*payoff) * (finite_or_zero(*probability_percent) / 100.0)),
            _ => None,
        })
        .sum();
    let value = finite_or_zero(total);
    trace!("expected value of {}: {}", view.id(), value);
    value
}

/// Every Chance node of the forest in pre-order with its expected value.
#[instrument(level = "debug", skip(store))]
pub fn chance_report(store: &NodeStore) -> Vec<ChanceValue> {
    store
        .iter()
        .filter(|view| view.kind() == NodeKind::Chance)
        .map(|view| ChanceValue {
            id: view.id().clone(),
            level: view.level(),
            expected_value: node_value(&view),
        })
        .collect()
}

// NaN and infinite inputs count as 0. A sum that still overflows is clamped
// back to 0 so the result is always a displayable number.
fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_or_zero() {
        assert_eq!(finite_or_zero(f64::NAN), 0.0);
        assert_eq!(finite_or_zero(f64::INFINITY), 0.0);
        assert_eq!(finite_or_zero(-2.5), -2.5);
    }
}
