//! Semantic diagnostics and the sink that collects them
//!
//! Every diagnostic renders as one line of text:
//!
//! ```text
//! <category> at line(<n>)[, name=<id>] : <message>
//! ```
//!
//! except the statement-test and `write` checks, which keep the short
//! `Type error at line <n>: <message>` form.

use std::fmt;
use std::io;

use log::{debug, error};
use thiserror::Error;

use super::types::ExpType;
use crate::ast::BinaryOp;
use crate::common::CompileResult;

/// Broad class of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Scope,
    Type,
    /// The analyzer contradicted itself; not the user's fault
    Internal,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Scope => "Scope error",
            Category::Type => "Type error",
            Category::Internal => "Internal error",
        })
    }
}

/// What went wrong
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    // Scoping
    #[error("identifier is not declared")]
    Undeclared,

    #[error("function redeclared")]
    FunctionRedeclared,

    #[error("functions may only be declared at global scope")]
    FunctionNotGlobal,

    #[error("variable redeclared")]
    VariableRedeclared,

    #[error("array redeclared")]
    ArrayRedeclared,

    #[error("parameter redeclared")]
    ParameterRedeclared,

    // Types
    #[error("variable cannot be declared void")]
    VoidVariable,

    #[error("declaration has no type")]
    MissingTypeSpecifier,

    #[error("operand of '{op}' is void")]
    VoidOperand { op: BinaryOp },

    #[error("operand type mismatch: {left} {op} {right}")]
    OperandTypeMismatch {
        op: BinaryOp,
        left: ExpType,
        right: ExpType,
    },

    #[error("cannot assign to or from void")]
    VoidAssignment,

    #[error("type does not match: {target} = {value}")]
    AssignmentTypeMismatch { target: ExpType, value: ExpType },

    #[error("function is not declared")]
    FunctionNotDeclared,

    #[error("is not a function")]
    NotAFunction,

    #[error("argument count mismatch: expected {expected}, found {found}")]
    ArgumentCountMismatch { expected: usize, found: usize },

    #[error("argument type mismatch at position {position}: expected {expected}, found {found}")]
    ArgumentTypeMismatch {
        position: usize,
        expected: ExpType,
        found: ExpType,
    },

    #[error("function should return nothing")]
    ReturnValueInVoid,

    #[error("function should return something")]
    MissingReturnValue,

    #[error("return type mismatch: expected {expected}, found {found}")]
    ReturnTypeMismatch { expected: ExpType, found: ExpType },

    #[error("{statement} statement has no test")]
    MissingCondition { statement: &'static str },

    #[error("{statement} test is void")]
    VoidCondition { statement: &'static str },

    #[error("write of void value")]
    VoidWrite,

    // Internal consistency
    #[error("name resolved while building the symbol table is missing")]
    UnresolvedInChecker,

    #[error("block has no recorded scope")]
    MissingBlockScope,
}

impl DiagnosticKind {
    pub fn category(&self) -> Category {
        match self {
            DiagnosticKind::Undeclared
            | DiagnosticKind::FunctionRedeclared
            | DiagnosticKind::FunctionNotGlobal
            | DiagnosticKind::VariableRedeclared
            | DiagnosticKind::ArrayRedeclared
            | DiagnosticKind::ParameterRedeclared => Category::Scope,
            DiagnosticKind::UnresolvedInChecker | DiagnosticKind::MissingBlockScope => {
                Category::Internal
            }
            _ => Category::Type,
        }
    }

    /// Uses the short `Type error at line <n>: ...` record form
    fn is_legacy(&self) -> bool {
        matches!(self, DiagnosticKind::VoidCondition { .. } | DiagnosticKind::VoidWrite)
    }
}

/// One diagnostic, anchored at a source line
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", self.render())]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub line: u32,
    pub name: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, line: u32) -> Self {
        Self { kind, line, name: None }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn category(&self) -> Category {
        self.kind.category()
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    fn render(&self) -> String {
        if self.kind.is_legacy() {
            return format!("Type error at line {}: {}", self.line, self.kind);
        }
        match &self.name {
            Some(name) => format!(
                "{} at line({}), name={name} : {}",
                self.category(),
                self.line,
                self.kind
            ),
            None => format!("{} at line({}) : {}", self.category(), self.line, self.kind),
        }
    }
}

/// Ordered diagnostic sink with a cumulative failure flag
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
    failed: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        if diagnostic.category() == Category::Internal {
            error!("{diagnostic}");
        } else {
            debug!("{diagnostic}");
        }
        self.failed = true;
        self.items.push(diagnostic);
    }

    /// Set once any diagnostic has been reported; code generation is skipped
    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn has_internal_errors(&self) -> bool {
        self.items.iter().any(|d| d.category() == Category::Internal)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, predicate: impl Fn(&DiagnosticKind) -> bool) -> usize {
        self.items.iter().filter(|d| predicate(&d.kind)).count()
    }

    /// Stream every record, one per line
    pub fn write_to(&self, writer: &mut impl io::Write) -> CompileResult<()> {
        for diagnostic in &self.items {
            writeln!(writer, "{diagnostic}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_standard_record_with_name() {
        let d = Diagnostic::new(DiagnosticKind::Undeclared, 12).with_name("count");
        assert_eq!(
            d.to_string(),
            "Scope error at line(12), name=count : identifier is not declared"
        );
    }

    #[test]
    fn test_standard_record_without_name() {
        let d = Diagnostic::new(
            DiagnosticKind::OperandTypeMismatch {
                op: BinaryOp::Add,
                left: ExpType::Integer,
                right: ExpType::IntegerArray,
            },
            3,
        );
        assert_eq!(
            d.to_string(),
            "Type error at line(3) : operand type mismatch: Integer + IntegerArray"
        );
    }

    #[test]
    fn test_legacy_record() {
        let d = Diagnostic::new(DiagnosticKind::VoidCondition { statement: "while" }, 9);
        assert_eq!(d.to_string(), "Type error at line 9: while test is void");
    }

    #[test]
    fn test_record_has_no_error_source() {
        let d = Diagnostic::new(DiagnosticKind::Undeclared, 5).with_name("z");
        assert!(std::error::Error::source(&d).is_none());
        assert_eq!(d.to_string(), "Scope error at line(5), name=z : identifier is not declared");
    }

    #[test]
    fn test_categories() {
        assert_eq!(DiagnosticKind::ParameterRedeclared.category(), Category::Scope);
        assert_eq!(DiagnosticKind::VoidAssignment.category(), Category::Type);
        assert_eq!(DiagnosticKind::MissingBlockScope.category(), Category::Internal);
    }

    #[test]
    fn test_sink_sets_failure_flag_and_streams_lines() {
        let mut sink = Diagnostics::new();
        assert!(!sink.failed());

        sink.report(Diagnostic::new(DiagnosticKind::VariableRedeclared, 2).with_name("x"));
        sink.report(Diagnostic::new(DiagnosticKind::VoidWrite, 4));
        assert!(sink.failed());
        assert!(!sink.has_internal_errors());
        assert_eq!(sink.count(|k| *k == DiagnosticKind::VoidWrite), 1);

        let mut out = Vec::new();
        sink.write_to(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Scope error at line(2), name=x : variable redeclared\n\
             Type error at line 4: write of void value\n"
        );
    }
}
