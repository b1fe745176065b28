//! C-Minus Compiler - semantic analysis
//!
//! This library takes the syntax tree of a C-Minus translation unit, builds
//! its lexically scoped symbol table and type checks every expression and
//! statement against it.
//!
//! ## Architecture
//!
//! The crate is organized into:
//! - **AST** (`ast/`): Arena-allocated syntax tree handed over by the parser
//! - **Sema** (`sema/`): Scope store, builder pass, checker pass, diagnostics
//! - **Common** (`common/`): Shared infrastructure (errors, diagnostic rendering)
//!
//! The code generator consumes the finished [`sema::Analysis`]: memory
//! locations and signatures from its scope store, expression types from its
//! annotations. It must not run when [`sema::Analysis::failed`] is set.

pub mod ast;
pub mod common;
pub mod sema;

// Re-exports for convenience
pub use ast::{Ast, AstBuilder, NodeId};
pub use common::{CompileError, CompileResult, DiagnosticReporter};
pub use sema::{AnalyzerConfig, Analysis, Diagnostic, Diagnostics, ExpType, SemanticAnalyzer};
