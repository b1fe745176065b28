//! Abstract Syntax Tree definitions
//!
//! The tree is stored in an arena and addressed by [`NodeId`]. Nodes are
//! immutable once built; the semantic passes record everything they infer in
//! side tables keyed by node handle.

mod builder;
mod node;

pub use builder::AstBuilder;
pub use node::*;

/// A complete translation unit as produced by the parser
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
    }

    pub fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    pub fn child(&self, id: NodeId, slot: usize) -> Option<NodeId> {
        self.node(id).child(slot)
    }

    /// Iterate a sibling chain starting at `first`
    pub fn siblings(&self, first: Option<NodeId>) -> Siblings<'_> {
        Siblings { ast: self, next: first }
    }
}

/// Iterator over a sibling-linked list of nodes
pub struct Siblings<'a> {
    ast: &'a Ast,
    next: Option<NodeId>,
}

impl Iterator for Siblings<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.ast.node(current).sibling;
        Some(current)
    }
}
