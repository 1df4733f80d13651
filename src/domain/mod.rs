//! Domain layer: the decision tree model and its evaluation
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod error;
pub mod evaluation;
pub mod id;
pub mod node;
pub mod store;

pub use error::{DomainError, DomainResult};
pub use evaluation::{chance_report, expected_value, node_value, ChanceValue};
pub use id::{IdGenerator, IdStyle};
pub use node::{NodeFields, NodeId, NodeKind, NodeUpdate};
pub use store::{NodeRecord, NodeStore, NodeView, PreOrderIterator};
