//! Node representation

use std::fmt;

/// Maximum number of ordered child slots on any node
pub const MAX_CHILDREN: usize = 3;

/// Stable handle to a node inside an [`Ast`](super::Ast)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(super) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Type specifier token as written in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSpec {
    Int,
    Void,
}

/// A single tree node
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub line: u32,
    pub children: [Option<NodeId>; MAX_CHILDREN],
    pub sibling: Option<NodeId>,
}

impl Node {
    pub fn new(kind: NodeKind, line: u32) -> Self {
        Self {
            kind,
            line,
            children: [None; MAX_CHILDREN],
            sibling: None,
        }
    }

    pub fn with_child(mut self, slot: usize, child: Option<NodeId>) -> Self {
        self.children[slot] = child;
        self
    }

    pub fn child(&self, slot: usize) -> Option<NodeId> {
        self.children.get(slot).copied().flatten()
    }

    /// Name carried by declarations, parameters and name-bearing expressions
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Decl(
                Decl::Variable { name, .. }
                | Decl::ArrayVariable { name, .. }
                | Decl::Function { name, .. },
            ) => Some(name.as_str()),
            NodeKind::Expr(
                Expr::Identifier { name } | Expr::ArrayIdentifier { name } | Expr::Call { name },
            ) => Some(name.as_str()),
            NodeKind::Param(param) => param.name.as_deref(),
            _ => None,
        }
    }
}

/// Node kinds and their payloads
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Decl(Decl),
    Stmt(Stmt),
    Expr(Expr),
    Param(Param),
}

/// Declarations
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    /// `int x;`
    Variable { name: String, spec: Option<TypeSpec> },

    /// `int a[10];`
    ArrayVariable {
        name: String,
        spec: Option<TypeSpec>,
        len: Option<u32>,
    },

    /// Function definition. Children: parameter list, body.
    Function {
        name: String,
        return_spec: Option<TypeSpec>,
    },
}

/// Statements
///
/// Child slots:
/// - `Compound`: local declarations, statement list
/// - `If`: condition, then-branch
/// - `IfElse`: condition, then-branch, else-branch
/// - `Iteration`: condition, body
/// - `Return`: optional value
/// - `Assign`: target, value
/// - `Write`: value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stmt {
    Compound,
    If,
    IfElse,
    Iteration,
    Return,
    Assign,
    Write,
}

/// Expressions
///
/// Child slots:
/// - `ArrayIdentifier`: optional index
/// - `Call`: argument list
/// - `BinaryOp`, `Assign`: left, right
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Identifier { name: String },
    ArrayIdentifier { name: String },
    Call { name: String },
    Constant(i64),
    BinaryOp(BinaryOp),
    Assign,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Option<String>,
    pub spec: Option<TypeSpec>,
    pub is_array: bool,
}

impl Param {
    /// `(void)` parameter list marker
    pub fn is_void_marker(&self) -> bool {
        self.name.is_none() && self.spec == Some(TypeSpec::Void)
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
