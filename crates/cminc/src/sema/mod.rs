//! Semantic analysis module
//!
//! Two passes over the parsed tree:
//! - the builder pass ([`SymbolTableBuilder`]) fills the [`ScopeStore`] and
//!   reports scoping errors;
//! - the checker pass ([`TypeChecker`]) infers expression types and reports
//!   type errors.
//!
//! [`SemanticAnalyzer`] runs both in order.

mod analyzer;
mod annotations;
mod builder;
mod checker;
mod diagnostic;
mod scope;
mod types;
mod walk;

pub use analyzer::{AnalyzerConfig, Analysis, SemanticAnalyzer};
pub use annotations::Annotations;
pub use builder::{BuildOutput, SymbolTableBuilder};
pub use checker::TypeChecker;
pub use diagnostic::{Category, Diagnostic, DiagnosticKind, Diagnostics};
pub use scope::{
    BUCKET_COUNT, GLOBAL_SCOPE_NAME, Scope, ScopeId, ScopeStore, Symbol, SymbolId, bucket_index,
};
pub use types::ExpType;
pub use walk::{Visitor, traverse};
