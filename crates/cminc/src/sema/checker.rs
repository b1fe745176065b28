//! Type checking
//!
//! Second pass over the tree. Re-enters each block's scope through the handle
//! recorded by the builder pass, infers a type for every expression bottom-up
//! and validates assignments, operators, tests, returns and call sites.

use log::debug;

use super::annotations::Annotations;
use super::diagnostic::{Diagnostic, DiagnosticKind, Diagnostics};
use super::scope::{ScopeId, ScopeStore, SymbolId};
use super::types::ExpType;
use super::walk::{Visitor, traverse};
use crate::ast::{Ast, BinaryOp, Decl, Expr, NodeId, NodeKind, Param, Stmt, TypeSpec};

/// Traversal state of the checker pass
pub struct TypeChecker<'a> {
    store: &'a ScopeStore,
    annotations: &'a mut Annotations,
    diagnostics: &'a mut Diagnostics,
    global: ScopeId,
    current: ScopeId,
    /// Enclosing accepted function, for return checks
    function: Option<SymbolId>,
    /// Saved `function` of each function declaration being visited
    outer_functions: Vec<Option<SymbolId>>,
}

impl<'a> TypeChecker<'a> {
    /// Run the checker over `ast` using a store filled by the builder pass
    pub fn check(
        ast: &Ast,
        store: &'a ScopeStore,
        annotations: &'a mut Annotations,
        diagnostics: &'a mut Diagnostics,
    ) {
        let Some(global) = store.global() else {
            debug!("no global scope, skipping type check");
            return;
        };
        let mut checker = Self {
            store,
            annotations,
            diagnostics,
            global,
            current: global,
            function: None,
            outer_functions: Vec::new(),
        };
        debug!("type checking {} nodes", ast.len());
        traverse(ast, ast.root(), &mut checker);
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.report(diagnostic);
    }

    fn lookup_type(&self, name: &str) -> Option<ExpType> {
        self.store
            .lookup(self.current, name)
            .map(|symbol| self.store.symbol(symbol).ty)
    }

    /// Type of an operand, re-resolving plain names against the current scope
    fn operand_type(&self, ast: &Ast, id: NodeId) -> Option<ExpType> {
        match &ast.node(id).kind {
            NodeKind::Expr(Expr::Identifier { name }) => {
                if self.annotations.is_unresolved(id) {
                    None
                } else {
                    self.lookup_type(name)
                }
            }
            NodeKind::Expr(Expr::ArrayIdentifier { .. }) => {
                if ast.child(id, 0).is_some() {
                    Some(ExpType::Integer)
                } else {
                    Some(ExpType::IntegerArray)
                }
            }
            _ => self.annotations.type_of(id),
        }
    }

    fn check_identifier(&mut self, id: NodeId, name: &str, line: u32) -> Option<ExpType> {
        if self.annotations.is_unresolved(id) {
            return None;
        }
        let ty = self.lookup_type(name);
        if ty.is_none() {
            self.report(Diagnostic::new(DiagnosticKind::UnresolvedInChecker, line).with_name(name));
        }
        ty
    }

    fn check_binary(&mut self, ast: &Ast, id: NodeId, op: BinaryOp, line: u32) -> ExpType {
        let left = ast.child(id, 0).and_then(|l| self.operand_type(ast, l));
        let right = ast.child(id, 1).and_then(|r| self.operand_type(ast, r));

        if left == Some(ExpType::Void) || right == Some(ExpType::Void) {
            self.report(Diagnostic::new(DiagnosticKind::VoidOperand { op }, line));
        } else if let (Some(left), Some(right)) = (left, right) {
            if left != right {
                self.report(Diagnostic::new(
                    DiagnosticKind::OperandTypeMismatch { op, left, right },
                    line,
                ));
            }
        }
        ExpType::Integer
    }

    fn check_assignment(&mut self, ast: &Ast, id: NodeId, line: u32) -> Option<ExpType> {
        let target = ast.child(id, 0).and_then(|t| self.operand_type(ast, t));
        let value = ast.child(id, 1).and_then(|v| self.operand_type(ast, v));

        match (target, value) {
            (Some(ExpType::Void), _) | (_, Some(ExpType::Void)) => {
                self.report(Diagnostic::new(DiagnosticKind::VoidAssignment, line));
            }
            (Some(target @ ExpType::IntegerArray), Some(value @ ExpType::Integer))
            | (Some(target @ ExpType::Integer), Some(value @ ExpType::IntegerArray)) => {
                self.report(Diagnostic::new(
                    DiagnosticKind::AssignmentTypeMismatch { target, value },
                    line,
                ));
            }
            _ => {}
        }
        target
    }

    fn check_call(&mut self, ast: &Ast, id: NodeId, name: &str, line: u32) -> Option<ExpType> {
        if self.annotations.is_unresolved(id) {
            return None;
        }
        let Some(symbol) = self.store.lookup_local(self.global, name) else {
            self.report(Diagnostic::new(DiagnosticKind::FunctionNotDeclared, line).with_name(name));
            return None;
        };
        let store = self.store;
        let function = store.symbol(symbol);
        if !function.is_function {
            self.report(Diagnostic::new(DiagnosticKind::NotAFunction, line).with_name(name));
            return None;
        }

        let args: Vec<NodeId> = ast.siblings(ast.child(id, 0)).collect();
        for (position, (&arg, &expected)) in args.iter().zip(&function.parameter_types).enumerate() {
            if let Some(found) = self.operand_type(ast, arg) {
                if found != expected {
                    self.report(
                        Diagnostic::new(
                            DiagnosticKind::ArgumentTypeMismatch {
                                position: position + 1,
                                expected,
                                found,
                            },
                            line,
                        )
                        .with_name(name),
                    );
                }
            }
        }
        if args.len() != function.parameter_types.len() {
            self.report(
                Diagnostic::new(
                    DiagnosticKind::ArgumentCountMismatch {
                        expected: function.parameter_types.len(),
                        found: args.len(),
                    },
                    line,
                )
                .with_name(name),
            );
        }
        Some(function.ty)
    }

    fn check_condition(&mut self, ast: &Ast, id: NodeId, statement: &'static str, line: u32) {
        match ast.child(id, 0) {
            None => self.report(Diagnostic::new(DiagnosticKind::MissingCondition { statement }, line)),
            Some(cond) => {
                if self.operand_type(ast, cond) == Some(ExpType::Void) {
                    self.report(Diagnostic::new(DiagnosticKind::VoidCondition { statement }, line));
                }
            }
        }
    }

    fn check_return(&mut self, ast: &Ast, id: NodeId, line: u32) {
        let Some(symbol) = self.function else {
            return;
        };
        let store = self.store;
        let function = store.symbol(symbol);
        let value = ast.child(id, 0);

        let kind = match (function.ty, value) {
            (ExpType::Void, Some(_)) => Some(DiagnosticKind::ReturnValueInVoid),
            (ExpType::Void, None) => None,
            (_, None) => Some(DiagnosticKind::MissingReturnValue),
            (expected, Some(value)) => match self.operand_type(ast, value) {
                Some(found) if found != expected => {
                    Some(DiagnosticKind::ReturnTypeMismatch { expected, found })
                }
                _ => None,
            },
        };
        if let Some(kind) = kind {
            let name = function.name.clone();
            self.report(Diagnostic::new(kind, line).with_name(name));
        }
    }

    fn check_variable(&mut self, spec: Option<TypeSpec>, name: &str, line: u32) {
        let kind = match spec {
            None => DiagnosticKind::MissingTypeSpecifier,
            Some(TypeSpec::Void) => DiagnosticKind::VoidVariable,
            Some(TypeSpec::Int) => return,
        };
        self.report(Diagnostic::new(kind, line).with_name(name));
    }

    fn check_write(&mut self, ast: &Ast, id: NodeId, line: u32) {
        let value = ast.child(id, 0).and_then(|v| self.operand_type(ast, v));
        if value == Some(ExpType::Void) {
            self.report(Diagnostic::new(DiagnosticKind::VoidWrite, line));
        }
    }

    fn check_param(&mut self, id: NodeId, param: &Param) {
        if param.name.is_some() {
            self.annotations.set_type(id, ExpType::storage(param.is_array));
        }
    }
}

impl Visitor for TypeChecker<'_> {
    fn pre(&mut self, ast: &Ast, id: NodeId) {
        let node = ast.node(id);
        match &node.kind {
            NodeKind::Decl(Decl::Function { name, .. }) => {
                self.outer_functions.push(self.function);
                // A redeclaration answers to the first global function of that name
                self.function = self.annotations.function_symbol(id).or_else(|| {
                    self.store
                        .lookup_local(self.global, name)
                        .filter(|&symbol| self.store.symbol(symbol).is_function)
                });
            }
            NodeKind::Stmt(Stmt::Compound) => match self.annotations.block_scope(id) {
                Some(scope) => {
                    debug!("enter scope '{}'", self.store.scope(scope).name());
                    self.current = scope;
                }
                None => self.report(Diagnostic::new(DiagnosticKind::MissingBlockScope, node.line)),
            },
            _ => {}
        }
    }

    fn post(&mut self, ast: &Ast, id: NodeId) {
        let node = ast.node(id);
        let line = node.line;
        let ty = match &node.kind {
            NodeKind::Expr(expr) => match expr {
                Expr::Constant(_) => Some(ExpType::Integer),
                Expr::Identifier { name } => self.check_identifier(id, name, line),
                Expr::ArrayIdentifier { name } => {
                    self.check_identifier(id, name, line);
                    self.operand_type(ast, id)
                }
                Expr::BinaryOp(op) => Some(self.check_binary(ast, id, *op, line)),
                Expr::Assign => self.check_assignment(ast, id, line),
                Expr::Call { name } => self.check_call(ast, id, name, line),
            },
            NodeKind::Stmt(stmt) => {
                match stmt {
                    Stmt::Compound => {
                        if let Some(scope) = self.annotations.block_scope(id) {
                            self.current = self.store.scope(scope).parent().unwrap_or(self.global);
                        }
                    }
                    Stmt::If | Stmt::IfElse => self.check_condition(ast, id, "if", line),
                    Stmt::Iteration => self.check_condition(ast, id, "while", line),
                    Stmt::Return => self.check_return(ast, id, line),
                    Stmt::Assign => {
                        self.check_assignment(ast, id, line);
                    }
                    Stmt::Write => self.check_write(ast, id, line),
                }
                None
            }
            NodeKind::Decl(decl) => match decl {
                Decl::Variable { name, spec } => {
                    self.check_variable(*spec, name, line);
                    Some(ExpType::Integer)
                }
                Decl::ArrayVariable { name, spec, .. } => {
                    self.check_variable(*spec, name, line);
                    Some(ExpType::IntegerArray)
                }
                Decl::Function { return_spec, .. } => {
                    self.function = self.outer_functions.pop().flatten();
                    Some(ExpType::from_return_spec(*return_spec))
                }
            },
            NodeKind::Param(param) => {
                self.check_param(id, param);
                None
            }
        };

        if let Some(ty) = ty {
            self.annotations.set_type(id, ty);
        }
    }
}
