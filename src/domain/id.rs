//! Fresh node id generation

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::trace;
use uuid::Uuid;

use crate::domain::NodeId;

/// How new ids are formed after the prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStyle {
    /// Monotonic counter: `ID1`, `ID2`, ...
    #[default]
    Sequential,
    /// 8 hex chars of a v4 uuid: `ID3f9a01c2`
    Random,
}

/// Hands out ids that are never repeated for the generator's lifetime.
///
/// Sequential ids come from a monotonic counter. Random ids are remembered
/// once issued, so a deleted node's id is not handed out again.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    prefix: String,
    style: IdStyle,
    counter: u64,
    /// Random mode only
    issued: HashSet<String>,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new("ID", IdStyle::Sequential)
    }
}

impl IdGenerator {
    pub fn new(prefix: impl Into<String>, style: IdStyle) -> Self {
        Self {
            prefix: prefix.into(),
            style,
            counter: 0,
            issued: HashSet::new(),
        }
    }

    pub fn style(&self) -> IdStyle {
        self.style
    }

    /// Produce an id for which `taken` is false and which was never issued.
    ///
    /// `taken` lets the store reject ids that already exist in the forest,
    /// e.g. nodes inserted with explicit ids.
    pub fn next_id(&mut self, taken: impl Fn(&str) -> bool) -> NodeId {
        loop {
            let candidate = match self.style {
                IdStyle::Sequential => {
                    self.counter += 1;
                    format!("{}{}", self.prefix, self.counter)
                }
                IdStyle::Random => {
                    let token = Uuid::new_v4().simple().to_string();
                    format!("{}{}", self.prefix, &token[..8])
                }
            };
            if taken(&candidate) || self.issued.contains(&candidate) {
                trace!("id collision, retrying: {}", candidate);
                continue;
            }
            if self.style == IdStyle::Random {
                self.issued.insert(candidate.clone());
            }
            return NodeId::new(candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids_use_prefix_and_counter() {
        let mut ids = IdGenerator::new("N", IdStyle::Sequential);
        assert_eq!(ids.next_id(|_| false).as_str(), "N1");
        assert_eq!(ids.next_id(|_| false).as_str(), "N2");
    }

    #[test]
    fn test_sequential_ids_skip_taken() {
        let mut ids = IdGenerator::default();
        let id = ids.next_id(|c| c == "ID1");
        assert_eq!(id.as_str(), "ID2");
    }

    #[test]
    fn test_sequential_ids_are_not_recorded() {
        let mut ids = IdGenerator::default();
        for _ in 0..100 {
            ids.next_id(|_| false);
        }
        assert!(ids.issued.is_empty());
        assert_eq!(ids.next_id(|_| false).as_str(), "ID101");
    }

    #[test]
    fn test_random_ids_are_distinct() {
        let mut ids = IdGenerator::new("ID", IdStyle::Random);
        let generated: HashSet<_> = (0..500).map(|_| ids.next_id(|_| false)).collect();
        assert_eq!(generated.len(), 500);
        assert!(generated.iter().all(|id| id.as_str().len() == 10));
        assert_eq!(ids.issued.len(), 500);
    }
}
