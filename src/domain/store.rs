use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::id::IdGenerator;
use crate::domain::node::{NodeFields, NodeId, NodeKind, NodeUpdate};

/// Tree node in the arena-based forest.
#[derive(Debug)]
struct TreeNode {
    id: NodeId,
    /// 1 for roots, parent level + 1 otherwise
    level: usize,
    fields: NodeFields,
    /// Index of parent node in the arena, None for root nodes
    parent: Option<Index>,
    /// Indices of child nodes in the arena, in insertion order
    children: Vec<Index>,
}

/// Arena-based forest of decision trees.
///
/// Uses a generational arena for node storage and an id map for lookups.
/// Roots are kept in insertion order. The store is the only owner of the
/// forest; callers get read-only `NodeView`s or owned `NodeRecord`s.
#[derive(Debug)]
pub struct NodeStore {
    /// Arena storage for all tree nodes
    arena: Arena<TreeNode>,
    /// Root nodes in insertion order
    roots: Vec<Index>,
    /// id -> arena index, one entry per live node
    index: HashMap<NodeId, Index>,
    ids: IdGenerator,
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore {
    pub fn new() -> Self {
        Self::with_ids(IdGenerator::default())
    }

    pub fn with_ids(ids: IdGenerator) -> Self {
        Self {
            arena: Arena::new(),
            roots: Vec::new(),
            index: HashMap::new(),
            ids,
        }
    }

    /// Create a node of `kind`, either as a new root or as the last child
    /// of `parent`.
    ///
    /// # Errors
    /// * `NotFound` if `parent` names no node
    /// * `InvalidOperation` if `parent` is an End node
    pub fn create_node(&mut self, parent: Option<&str>, kind: NodeKind) -> DomainResult<NodeId> {
        self.create_node_avoiding(parent, kind, |_| false)
    }

    /// Like `create_node`, but never generates an id for which `reserved`
    /// is true. Front ends use it to keep generated ids apart from names
    /// they resolve on their own.
    #[instrument(level = "debug", skip(self, reserved))]
    pub fn create_node_avoiding(
        &mut self,
        parent: Option<&str>,
        kind: NodeKind,
        reserved: impl Fn(&str) -> bool,
    ) -> DomainResult<NodeId> {
        let (parent_idx, level) = match parent {
            None => (None, 1),
            Some(parent_id) => {
                let parent_idx = self.lookup(parent_id)?;
                let parent_node = &self.arena[parent_idx];
                if !parent_node.fields.kind().accepts_children() {
                    return Err(DomainError::InvalidOperation {
                        id: parent_node.id.clone(),
                        reason: "end nodes cannot have children".to_string(),
                    });
                }
                (Some(parent_idx), parent_node.level + 1)
            }
        };

        let index = &self.index;
        let id = self
            .ids
            .next_id(|candidate| index.contains_key(candidate) || reserved(candidate));

        let node_idx = self.arena.insert(TreeNode {
            id: id.clone(),
            level,
            fields: NodeFields::neutral(kind),
            parent: parent_idx,
            children: Vec::new(),
        });
        match parent_idx {
            Some(parent_idx) => self.arena[parent_idx].children.push(node_idx),
            None => self.roots.push(node_idx),
        }
        self.index.insert(id.clone(), node_idx);

        debug!("created {} node {} at level {}", kind, id, level);
        Ok(id)
    }

    /// Apply the fields of `update` that belong to the node's kind.
    ///
    /// Never touches kind, id, level or children.
    #[instrument(level = "debug", skip(self))]
    pub fn update_node(&mut self, id: &str, update: &NodeUpdate) -> DomainResult<()> {
        let node_idx = self.lookup(id)?;
        let node = &mut self.arena[node_idx];
        if node.fields.apply(update) {
            debug!("updated {} node {}", node.fields.kind(), node.id);
        } else {
            trace!("update left node {} unchanged", node.id);
        }
        Ok(())
    }

    /// Remove the node and its whole subtree.
    ///
    /// An absent, empty or unknown id is a no-op. Returns the number of
    /// nodes removed.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_node(&mut self, id: Option<&str>) -> usize {
        let Some(id) = id.filter(|id| !id.is_empty()) else {
            debug!("remove_node: nothing selected");
            return 0;
        };
        let Some(&node_idx) = self.index.get(id) else {
            debug!("remove_node: {} not in forest", id);
            return 0;
        };

        let subtree: Vec<Index> = PreOrderIterator::new(self, vec![node_idx])
            .map(|view| view.idx)
            .collect();

        match self.arena[node_idx].parent {
            Some(parent_idx) => {
                if let Some(parent) = self.arena.get_mut(parent_idx) {
                    parent.children.retain(|&child| child != node_idx);
                }
            }
            None => self.roots.retain(|&root| root != node_idx),
        }

        for idx in &subtree {
            if let Some(node) = self.arena.remove(*idx) {
                self.index.remove(&node.id);
            }
        }

        debug!("removed {} ({} nodes)", id, subtree.len());
        subtree.len()
    }

    #[instrument(level = "trace", skip(self))]
    pub fn find(&self, id: &str) -> Option<NodeView<'_>> {
        self.index.get(id).map(|&idx| self.view(idx))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Pre-order listing of the whole forest: roots in insertion order, each
    /// followed by its children in insertion order.
    #[instrument(level = "trace", skip(self))]
    pub fn flatten(&self) -> Vec<NodeView<'_>> {
        self.iter().collect()
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self) -> PreOrderIterator<'_> {
        PreOrderIterator::new(self, self.roots.clone())
    }

    pub fn roots(&self) -> Vec<NodeView<'_>> {
        self.roots.iter().map(|&idx| self.view(idx)).collect()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Deepest level in the forest, 0 when empty.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.iter().map(|view| view.level()).max().unwrap_or(0)
    }

    /// Nodes without children, in pre-order.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<NodeView<'_>> {
        self.iter().filter(|view| view.is_leaf()).collect()
    }

    /// Owned nested snapshot of the whole forest.
    pub fn snapshot(&self) -> Vec<NodeRecord> {
        self.roots().iter().map(NodeView::snapshot).collect()
    }

    fn lookup(&self, id: &str) -> DomainResult<Index> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| DomainError::NotFound(NodeId::from(id)))
    }

    fn view(&self, idx: Index) -> NodeView<'_> {
        NodeView {
            store: self,
            idx,
            node: &self.arena[idx],
        }
    }
}

/// Read-only view of one node inside a `NodeStore`.
#[derive(Clone, Copy)]
pub struct NodeView<'a> {
    store: &'a NodeStore,
    idx: Index,
    node: &'a TreeNode,
}

impl<'a> NodeView<'a> {
    pub fn id(&self) -> &'a NodeId {
        &self.node.id
    }

    pub fn kind(&self) -> NodeKind {
        self.node.fields.kind()
    }

    pub fn level(&self) -> usize {
        self.node.level
    }

    pub fn fields(&self) -> &'a NodeFields {
        &self.node.fields
    }

    pub fn parent(&self) -> Option<NodeView<'a>> {
        self.node.parent.map(|idx| self.store.view(idx))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeView<'a>> + 'a {
        let store = self.store;
        let node = self.node;
        node.children.iter().map(move |&idx| store.view(idx))
    }

    pub fn child_count(&self) -> usize {
        self.node.children.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.node.children.is_empty()
    }

    /// Owned copy of this node and its subtree.
    pub fn snapshot(&self) -> NodeRecord {
        NodeRecord {
            id: self.node.id.clone(),
            level: self.node.level,
            fields: self.node.fields.clone(),
            children: self.children().map(|child| child.snapshot()).collect(),
        }
    }
}

impl fmt::Debug for NodeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeView")
            .field("id", &self.node.id)
            .field("level", &self.node.level)
            .field("fields", &self.node.fields)
            .field("children", &self.node.children.len())
            .finish()
    }
}

impl PartialEq for NodeView<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.store, other.store) && self.idx == other.idx
    }
}

/// Plain nested record of a node and its subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub level: usize,
    #[serde(flatten)]
    pub fields: NodeFields,
    pub children: Vec<NodeRecord>,
}

pub struct PreOrderIterator<'a> {
    store: &'a NodeStore,
    stack: Vec<Index>,
}

impl<'a> PreOrderIterator<'a> {
    fn new(store: &'a NodeStore, mut starts: Vec<Index>) -> Self {
        starts.reverse();
        Self {
            store,
            stack: starts,
        }
    }
}

impl<'a> Iterator for PreOrderIterator<'a> {
    type Item = NodeView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.store.arena.get(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some(NodeView {
                    store: self.store,
                    idx: current_idx,
                    node,
                });
            }
        }
        None
    }
}
