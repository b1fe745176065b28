//! Generic pre/post order tree traversal

use crate::ast::{Ast, NodeId};

/// Callbacks invoked around each node's subtree
pub trait Visitor {
    /// Called before the node's children are visited
    fn pre(&mut self, ast: &Ast, id: NodeId);

    /// Called after the node's children, before its next sibling
    fn post(&mut self, ast: &Ast, id: NodeId);
}

/// Walk `start` and its siblings, descending into child slots in order
///
/// Children recurse; sibling lists are walked iteratively.
pub fn traverse<V: Visitor + ?Sized>(ast: &Ast, start: Option<NodeId>, visitor: &mut V) {
    let mut current = start;
    while let Some(id) = current {
        visitor.pre(ast, id);
        let node = ast.node(id);
        for child in node.children {
            traverse(ast, child, visitor);
        }
        visitor.post(ast, id);
        current = node.sibling;
    }
}
