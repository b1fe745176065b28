//! Symbol table and scope management
//!
//! All scopes of a translation unit live in one arena owned by [`ScopeStore`].
//! A scope refers to its lexical parent by handle, and every symbol records
//! the scope that owns it. Each scope indexes its symbols through a fixed
//! number of hash buckets with chaining.

use std::fmt::Write as _;
use std::io;

use log::{debug, trace};

use super::types::ExpType;
use crate::common::{CompileError, CompileResult};

/// Number of hash buckets per scope
pub const BUCKET_COUNT: usize = 211;

/// Multiplier shift of the bucket hash
const SHIFT: u32 = 4;

/// Name of the outermost scope
pub const GLOBAL_SCOPE_NAME: &str = "global";

/// Order-sensitive string hash into `0..BUCKET_COUNT`
pub fn bucket_index(key: &str) -> usize {
    key.bytes()
        .fold(0usize, |acc, byte| ((acc << SHIFT) + byte as usize) % BUCKET_COUNT)
}

/// Handle to a scope in a [`ScopeStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a symbol in a [`ScopeStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A symbol in the symbol table
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub ty: ExpType,
    pub memory_location: u32,
    pub is_function: bool,
    /// Parameter signature, in declaration order (functions only)
    pub parameter_types: Vec<ExpType>,
    /// Declaration line followed by every line the name is used on
    pub reference_lines: Vec<u32>,
    pub scope: ScopeId,
}

impl Symbol {
    /// Kind column of the symbol table listing
    pub fn kind_label(&self) -> &'static str {
        if self.is_function {
            "Function"
        } else {
            self.ty.as_str()
        }
    }
}

/// A scope containing symbols
#[derive(Debug)]
pub struct Scope {
    name: String,
    parent: Option<ScopeId>,
    buckets: Vec<Vec<SymbolId>>,
    location: u32,
}

impl Scope {
    fn new(name: String, parent: Option<ScopeId>) -> Self {
        Self {
            name,
            parent,
            buckets: vec![Vec::new(); BUCKET_COUNT],
            location: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /// Next unused memory slot
    pub fn location(&self) -> u32 {
        self.location
    }

    /// Symbols in bucket order, chains in insertion order
    pub fn symbol_ids(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.buckets.iter().flatten().copied()
    }
}

/// Arena of every scope and symbol of one compilation unit
///
/// A store is filled by exactly one builder pass. Running the builder again
/// needs a fresh store.
#[derive(Debug, Default)]
pub struct ScopeStore {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
}

impl ScopeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scope nested in `parent`; the first scope created is the global one
    pub fn create_scope(&mut self, name: impl Into<String>, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        let scope = Scope::new(name.into(), parent);
        debug!("create scope '{}' ({:?}, parent {:?})", scope.name, id, parent);
        self.scopes.push(scope);
        id
    }

    pub fn global(&self) -> Option<ScopeId> {
        if self.scopes.is_empty() { None } else { Some(ScopeId(0)) }
    }

    /// First scope created with this name
    pub fn find_scope_by_name(&self, name: &str) -> Option<ScopeId> {
        self.scopes
            .iter()
            .position(|scope| scope.name == name)
            .map(|index| ScopeId(index as u32))
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn scopes(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes
            .iter()
            .enumerate()
            .map(|(index, scope)| (ScopeId(index as u32), scope))
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn symbols(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(index, symbol)| (SymbolId(index as u32), symbol))
    }

    /// Hand out the scope's next memory slot
    pub fn allocate_location(&mut self, scope: ScopeId) -> u32 {
        let scope = &mut self.scopes[scope.index()];
        let location = scope.location;
        scope.location += 1;
        location
    }

    /// Insert `name` into `scope`, or log another use if it is already there
    ///
    /// The location only applies when a new symbol is created. Callers check
    /// for redeclaration with [`lookup_local`](Self::lookup_local) first.
    pub fn insert(
        &mut self,
        scope: ScopeId,
        name: &str,
        ty: ExpType,
        line: u32,
        location: u32,
        is_function: bool,
    ) -> SymbolId {
        if let Some(existing) = self.lookup_local(scope, name) {
            self.add_reference_line(existing, line);
            return existing;
        }

        let id = SymbolId(self.symbols.len() as u32);
        trace!(
            "insert '{}' : {} at location {} in scope '{}'",
            name,
            ty,
            location,
            self.scopes[scope.index()].name
        );
        self.symbols.push(Symbol {
            name: name.to_string(),
            ty,
            memory_location: location,
            is_function,
            parameter_types: Vec::new(),
            reference_lines: vec![line],
            scope,
        });
        self.scopes[scope.index()].buckets[bucket_index(name)].push(id);
        id
    }

    /// Look a name up in `scope`, then in each enclosing scope
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(symbol) = self.lookup_local(id, name) {
                return Some(symbol);
            }
            current = self.scopes[id.index()].parent;
        }
        None
    }

    /// Look a name up in `scope` only
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scopes[scope.index()].buckets[bucket_index(name)]
            .iter()
            .copied()
            .find(|id| self.symbols[id.index()].name == name)
    }

    pub fn add_reference_line(&mut self, symbol: SymbolId, line: u32) {
        let symbol = &mut self.symbols[symbol.index()];
        trace!("reference '{}' at line {}", symbol.name, line);
        symbol.reference_lines.push(line);
    }

    /// Append a parameter type to the signature of a global function
    pub fn register_parameter_type(&mut self, function_name: &str, ty: ExpType) -> CompileResult<()> {
        let symbol = self
            .global()
            .and_then(|global| self.lookup_local(global, function_name))
            .filter(|id| self.symbols[id.index()].is_function)
            .ok_or_else(|| {
                CompileError::symbol_table(format!("no global function named '{function_name}'"))
            })?;
        self.symbols[symbol.index()].parameter_types.push(ty);
        Ok(())
    }

    /// Fixed-column listing of every symbol in every scope
    pub fn dump(&self) -> String {
        let mut out = String::new();
        out.push_str("Variable Name  Variable Type  Scope Name  Location   Line Numbers\n");
        out.push_str("-------------  -------------  ----------  --------   ------------\n");
        for scope in &self.scopes {
            for id in scope.symbol_ids() {
                let symbol = &self.symbols[id.index()];
                let lines = symbol
                    .reference_lines
                    .iter()
                    .map(|line| line.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                let _ = writeln!(
                    out,
                    "{:<15}{:<15}{:<12}{:<11}{}",
                    symbol.name,
                    symbol.kind_label(),
                    scope.name,
                    symbol.memory_location,
                    lines
                );
            }
        }
        out
    }

    pub fn write_symtab(&self, writer: &mut impl io::Write) -> CompileResult<()> {
        writer.write_all(self.dump().as_bytes())?;
        Ok(())
    }
}
