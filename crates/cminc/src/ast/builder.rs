//! Convenience constructors for building trees
//!
//! Parsers and tests build trees through [`AstBuilder`] so that child slot
//! conventions live in one place.

use super::{Ast, BinaryOp, Decl, Expr, Node, NodeId, NodeKind, Param, Stmt, TypeSpec};

#[derive(Debug, Default)]
pub struct AstBuilder {
    ast: Ast,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, node: Node) -> NodeId {
        self.ast.push(node)
    }

    /// Chain `items` through their sibling links, returning the head
    pub fn list(&mut self, items: &[NodeId]) -> Option<NodeId> {
        for pair in items.windows(2) {
            self.ast.node_mut(pair[0]).sibling = Some(pair[1]);
        }
        items.first().copied()
    }

    /// Finish with the declaration list `decls` as the root
    pub fn finish(mut self, decls: &[NodeId]) -> Ast {
        let root = self.list(decls);
        self.ast.set_root(root);
        self.ast
    }

    // Declarations

    pub fn var(&mut self, name: &str, spec: Option<TypeSpec>, line: u32) -> NodeId {
        let kind = NodeKind::Decl(Decl::Variable {
            name: name.to_string(),
            spec,
        });
        self.add(Node::new(kind, line))
    }

    pub fn int_var(&mut self, name: &str, line: u32) -> NodeId {
        self.var(name, Some(TypeSpec::Int), line)
    }

    pub fn array_var(&mut self, name: &str, spec: Option<TypeSpec>, len: Option<u32>, line: u32) -> NodeId {
        let kind = NodeKind::Decl(Decl::ArrayVariable {
            name: name.to_string(),
            spec,
            len,
        });
        self.add(Node::new(kind, line))
    }

    pub fn function(
        &mut self,
        name: &str,
        return_spec: Option<TypeSpec>,
        params: Option<NodeId>,
        body: Option<NodeId>,
        line: u32,
    ) -> NodeId {
        let kind = NodeKind::Decl(Decl::Function {
            name: name.to_string(),
            return_spec,
        });
        self.add(Node::new(kind, line).with_child(0, params).with_child(1, body))
    }

    pub fn param(&mut self, name: Option<&str>, spec: Option<TypeSpec>, is_array: bool, line: u32) -> NodeId {
        let kind = NodeKind::Param(Param {
            name: name.map(str::to_string),
            spec,
            is_array,
        });
        self.add(Node::new(kind, line))
    }

    pub fn int_param(&mut self, name: &str, line: u32) -> NodeId {
        self.param(Some(name), Some(TypeSpec::Int), false, line)
    }

    pub fn array_param(&mut self, name: &str, line: u32) -> NodeId {
        self.param(Some(name), Some(TypeSpec::Int), true, line)
    }

    /// The `(void)` marker of an empty parameter list
    pub fn void_params(&mut self, line: u32) -> NodeId {
        self.param(None, Some(TypeSpec::Void), false, line)
    }

    // Statements

    pub fn compound(&mut self, locals: &[NodeId], stmts: &[NodeId], line: u32) -> NodeId {
        let locals = self.list(locals);
        let stmts = self.list(stmts);
        let node = Node::new(NodeKind::Stmt(Stmt::Compound), line)
            .with_child(0, locals)
            .with_child(1, stmts);
        self.add(node)
    }

    pub fn if_stmt(&mut self, cond: Option<NodeId>, then: Option<NodeId>, otherwise: Option<NodeId>, line: u32) -> NodeId {
        let kind = if otherwise.is_some() { Stmt::IfElse } else { Stmt::If };
        let node = Node::new(NodeKind::Stmt(kind), line)
            .with_child(0, cond)
            .with_child(1, then)
            .with_child(2, otherwise);
        self.add(node)
    }

    pub fn while_stmt(&mut self, cond: Option<NodeId>, body: Option<NodeId>, line: u32) -> NodeId {
        let node = Node::new(NodeKind::Stmt(Stmt::Iteration), line)
            .with_child(0, cond)
            .with_child(1, body);
        self.add(node)
    }

    pub fn return_stmt(&mut self, value: Option<NodeId>, line: u32) -> NodeId {
        self.add(Node::new(NodeKind::Stmt(Stmt::Return), line).with_child(0, value))
    }

    pub fn assign_stmt(&mut self, target: NodeId, value: NodeId, line: u32) -> NodeId {
        let node = Node::new(NodeKind::Stmt(Stmt::Assign), line)
            .with_child(0, Some(target))
            .with_child(1, Some(value));
        self.add(node)
    }

    pub fn write_stmt(&mut self, value: NodeId, line: u32) -> NodeId {
        self.add(Node::new(NodeKind::Stmt(Stmt::Write), line).with_child(0, Some(value)))
    }

    // Expressions

    pub fn id(&mut self, name: &str, line: u32) -> NodeId {
        let kind = NodeKind::Expr(Expr::Identifier { name: name.to_string() });
        self.add(Node::new(kind, line))
    }

    pub fn array_id(&mut self, name: &str, index: Option<NodeId>, line: u32) -> NodeId {
        let kind = NodeKind::Expr(Expr::ArrayIdentifier { name: name.to_string() });
        self.add(Node::new(kind, line).with_child(0, index))
    }

    pub fn call(&mut self, name: &str, args: &[NodeId], line: u32) -> NodeId {
        let args = self.list(args);
        let kind = NodeKind::Expr(Expr::Call { name: name.to_string() });
        self.add(Node::new(kind, line).with_child(0, args))
    }

    pub fn constant(&mut self, value: i64, line: u32) -> NodeId {
        self.add(Node::new(NodeKind::Expr(Expr::Constant(value)), line))
    }

    pub fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId, line: u32) -> NodeId {
        let node = Node::new(NodeKind::Expr(Expr::BinaryOp(op)), line)
            .with_child(0, Some(left))
            .with_child(1, Some(right));
        self.add(node)
    }

    pub fn assign(&mut self, target: NodeId, value: NodeId, line: u32) -> NodeId {
        let node = Node::new(NodeKind::Expr(Expr::Assign), line)
            .with_child(0, Some(target))
            .with_child(1, Some(value));
        self.add(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_links_siblings_in_order() {
        let mut b = AstBuilder::new();
        let x = b.int_var("x", 1);
        let y = b.int_var("y", 2);
        let z = b.int_var("z", 3);
        let ast = b.finish(&[x, y, z]);

        let names: Vec<_> = ast
            .siblings(ast.root())
            .filter_map(|id| ast.node(id).name())
            .collect();
        assert_eq!(names, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_if_with_else_becomes_if_else() {
        let mut b = AstBuilder::new();
        let cond = b.constant(1, 4);
        let then = b.compound(&[], &[], 4);
        let otherwise = b.compound(&[], &[], 5);
        let stmt = b.if_stmt(Some(cond), Some(then), Some(otherwise), 4);
        let ast = b.finish(&[]);

        assert_eq!(ast.node(stmt).kind, NodeKind::Stmt(Stmt::IfElse));
        assert_eq!(ast.child(stmt, 2), Some(otherwise));
        assert!(ast.root().is_none());
    }
}
