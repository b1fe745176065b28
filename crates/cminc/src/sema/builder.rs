//! Symbol table construction
//!
//! First pass over the tree. Declares every name in the scope it belongs to,
//! opens a scope per function and per nested block, records which scope each
//! block owns, and reports uses of names that are not visible.

use log::{debug, error};

use super::annotations::Annotations;
use super::diagnostic::{Diagnostic, DiagnosticKind, Diagnostics};
use super::scope::{GLOBAL_SCOPE_NAME, ScopeId, ScopeStore};
use super::types::ExpType;
use super::walk::{Visitor, traverse};
use crate::ast::{Ast, Decl, Expr, NodeId, NodeKind, Param, Stmt};

/// Everything the builder pass produces
#[derive(Debug)]
pub struct BuildOutput {
    pub store: ScopeStore,
    pub annotations: Annotations,
    pub diagnostics: Diagnostics,
}

/// Traversal state of the builder pass
pub struct SymbolTableBuilder {
    store: ScopeStore,
    annotations: Annotations,
    diagnostics: Diagnostics,
    global: ScopeId,
    current: ScopeId,
    /// Scope of a function whose body block has not been entered yet
    pending_body: Option<ScopeId>,
    /// Function whose parameters are being declared (accepted declarations only)
    function: Option<String>,
    block_counter: u32,
}

impl SymbolTableBuilder {
    /// Start with a fresh store holding only the global scope
    pub fn new(builtins: bool) -> Self {
        let mut store = ScopeStore::new();
        let global = store.create_scope(GLOBAL_SCOPE_NAME, None);
        let mut builder = Self {
            store,
            annotations: Annotations::new(),
            diagnostics: Diagnostics::new(),
            global,
            current: global,
            pending_body: None,
            function: None,
            block_counter: 0,
        };
        if builtins {
            builder.declare_builtins();
        }
        builder
    }

    pub fn build(mut self, ast: &Ast) -> BuildOutput {
        debug!("building symbol table over {} nodes", ast.len());
        traverse(ast, ast.root(), &mut self);
        BuildOutput {
            store: self.store,
            annotations: self.annotations,
            diagnostics: self.diagnostics,
        }
    }

    /// `void output(int)` and `int input(void)`
    fn declare_builtins(&mut self) {
        let location = self.store.allocate_location(self.global);
        self.store.insert(self.global, "output", ExpType::Void, 0, location, true);
        self.register_parameter("output", ExpType::Integer);

        let location = self.store.allocate_location(self.global);
        self.store.insert(self.global, "input", ExpType::Integer, 0, location, true);
    }

    fn register_parameter(&mut self, function: &str, ty: ExpType) {
        if let Err(err) = self.store.register_parameter_type(function, ty) {
            error!("{err}");
        }
    }

    fn report(&mut self, kind: DiagnosticKind, line: u32, name: &str) {
        self.diagnostics.report(Diagnostic::new(kind, line).with_name(name));
    }

    /// Declare a variable-like name in the current scope unless it is already there
    fn declare_local(&mut self, name: &str, ty: ExpType, line: u32, redeclared: DiagnosticKind) -> bool {
        if self.store.lookup_local(self.current, name).is_some() {
            self.report(redeclared, line, name);
            return false;
        }
        let location = self.store.allocate_location(self.current);
        self.store.insert(self.current, name, ty, line, location, false);
        true
    }

    fn enter_function(&mut self, id: NodeId, name: &str, ty: ExpType, line: u32) {
        let accepted = if self.store.lookup_local(self.global, name).is_some() {
            self.report(DiagnosticKind::FunctionRedeclared, line, name);
            false
        } else if self.current != self.global {
            self.report(DiagnosticKind::FunctionNotGlobal, line, name);
            false
        } else {
            true
        };

        if accepted {
            let location = self.store.allocate_location(self.global);
            let symbol = self.store.insert(self.global, name, ty, line, location, true);
            self.annotations.set_function_symbol(id, symbol);
            self.function = Some(name.to_string());
        } else {
            self.function = None;
        }

        // Rejected functions still get a scope so their bodies are analysed.
        let scope = self.store.create_scope(name, Some(self.current));
        self.current = scope;
        self.pending_body = Some(scope);
    }

    fn declare_param(&mut self, param: &Param, line: u32) {
        if param.is_void_marker() {
            return;
        }
        let Some(name) = &param.name else {
            return;
        };
        let ty = ExpType::storage(param.is_array);
        if self.declare_local(name, ty, line, DiagnosticKind::ParameterRedeclared) {
            if let Some(function) = self.function.clone() {
                self.register_parameter(&function, ty);
            }
        }
    }

    fn enter_block(&mut self, id: NodeId) {
        let scope = match self.pending_body.take() {
            Some(scope) => scope,
            None => {
                let name = self.block_counter.to_string();
                self.block_counter += 1;
                let scope = self.store.create_scope(name, Some(self.current));
                self.current = scope;
                scope
            }
        };
        self.annotations.set_block_scope(id, scope);
    }

    fn leave_scope(&mut self) {
        self.current = self.store.scope(self.current).parent().unwrap_or(self.global);
    }

    fn resolve_use(&mut self, id: NodeId, name: &str, line: u32) {
        match self.store.lookup(self.current, name) {
            Some(symbol) => self.store.add_reference_line(symbol, line),
            None => {
                self.report(DiagnosticKind::Undeclared, line, name);
                self.annotations.mark_unresolved(id);
            }
        }
    }
}

impl Visitor for SymbolTableBuilder {
    fn pre(&mut self, ast: &Ast, id: NodeId) {
        let node = ast.node(id);
        let line = node.line;
        match &node.kind {
            NodeKind::Decl(Decl::Function { name, return_spec }) => {
                self.enter_function(id, name, ExpType::from_return_spec(*return_spec), line);
            }
            NodeKind::Decl(Decl::Variable { name, .. }) => {
                self.declare_local(name, ExpType::Integer, line, DiagnosticKind::VariableRedeclared);
            }
            NodeKind::Decl(Decl::ArrayVariable { name, .. }) => {
                self.declare_local(name, ExpType::IntegerArray, line, DiagnosticKind::ArrayRedeclared);
            }
            NodeKind::Param(param) => self.declare_param(param, line),
            NodeKind::Stmt(Stmt::Compound) => self.enter_block(id),
            NodeKind::Expr(
                Expr::Identifier { name } | Expr::ArrayIdentifier { name } | Expr::Call { name },
            ) => self.resolve_use(id, name, line),
            _ => {}
        }
    }

    fn post(&mut self, ast: &Ast, id: NodeId) {
        match &ast.node(id).kind {
            NodeKind::Stmt(Stmt::Compound) => self.leave_scope(),
            NodeKind::Decl(Decl::Function { .. }) => {
                // A function without a body never entered a block to pop its scope.
                if self.pending_body.take().is_some() {
                    self.leave_scope();
                }
                self.function = None;
            }
            _ => {}
        }
    }
}
