//! Side tables filled in by the semantic passes
//!
//! The parser's tree stays untouched. Everything the passes learn about a
//! node is keyed here by its [`NodeId`].

use std::collections::{HashMap, HashSet};

use super::scope::{ScopeId, SymbolId};
use super::types::ExpType;
use crate::ast::NodeId;

#[derive(Debug, Default, Clone)]
pub struct Annotations {
    types: HashMap<NodeId, ExpType>,
    block_scopes: HashMap<NodeId, ScopeId>,
    functions: HashMap<NodeId, SymbolId>,
    unresolved: HashSet<NodeId>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inferred type of an expression, declaration or parameter
    pub fn type_of(&self, node: NodeId) -> Option<ExpType> {
        self.types.get(&node).copied()
    }

    pub(crate) fn set_type(&mut self, node: NodeId, ty: ExpType) {
        self.types.insert(node, ty);
    }

    pub fn typed_nodes(&self) -> usize {
        self.types.len()
    }

    /// Scope owned by a compound statement
    pub fn block_scope(&self, node: NodeId) -> Option<ScopeId> {
        self.block_scopes.get(&node).copied()
    }

    pub(crate) fn set_block_scope(&mut self, node: NodeId, scope: ScopeId) {
        self.block_scopes.insert(node, scope);
    }

    /// Symbol of an accepted function declaration
    pub fn function_symbol(&self, node: NodeId) -> Option<SymbolId> {
        self.functions.get(&node).copied()
    }

    pub(crate) fn set_function_symbol(&mut self, node: NodeId, symbol: SymbolId) {
        self.functions.insert(node, symbol);
    }

    /// Use-site whose name did not resolve while building the symbol table
    pub fn is_unresolved(&self, node: NodeId) -> bool {
        self.unresolved.contains(&node)
    }

    pub(crate) fn mark_unresolved(&mut self, node: NodeId) {
        self.unresolved.insert(node);
    }
}
