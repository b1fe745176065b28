//! Common infrastructure shared by the AST and the semantic passes

mod error;

pub use error::{CompileError, CompileResult, DiagnosticReporter};
