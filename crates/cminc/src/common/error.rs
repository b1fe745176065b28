//! Error types and diagnostic reporting

use codespan_reporting::diagnostic::{Diagnostic as Report, Label};
use codespan_reporting::files::{Files, SimpleFiles};
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream, WriteColor};
use log::error;
use thiserror::Error;

use crate::sema::{Category, Diagnostic};

/// Failure of the analyzer machinery itself (not a user diagnostic)
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Symbol table error: {message}")]
    SymbolTable { message: String },

    #[error("Diagnostic rendering error: {message}")]
    Render { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    pub fn symbol_table(message: impl Into<String>) -> Self {
        Self::SymbolTable {
            message: message.into(),
        }
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Diagnostic reporter for pretty error output against the source text
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            config: term::Config::default(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        self.files.add(name.into(), source.into())
    }

    /// Build the codespan report for one diagnostic, labelling the whole source line
    fn build_report(&self, file_id: usize, diagnostic: &Diagnostic) -> Report<usize> {
        let report = match diagnostic.category() {
            Category::Internal => Report::bug(),
            Category::Scope | Category::Type => Report::error(),
        }
        .with_message(diagnostic.category().to_string());

        // Lines are 1-based; line 0 belongs to the built-in runtime and has no source.
        let range = (diagnostic.line() as usize)
            .checked_sub(1)
            .and_then(|index| self.files.line_range(file_id, index).ok());

        match range {
            Some(range) => report.with_labels(vec![
                Label::primary(file_id, range).with_message(diagnostic.message()),
            ]),
            None => report.with_notes(vec![diagnostic.to_string()]),
        }
    }

    pub fn emit_to(
        &self,
        writer: &mut dyn WriteColor,
        file_id: usize,
        diagnostic: &Diagnostic,
    ) -> CompileResult<()> {
        let report = self.build_report(file_id, diagnostic);
        term::emit(writer, &self.config, &self.files, &report)
            .map_err(|e| CompileError::render(e.to_string()))
    }

    pub fn report_error(&self, file_id: usize, diagnostic: &Diagnostic) {
        let writer = StandardStream::stderr(ColorChoice::Auto);
        if let Err(e) = self.emit_to(&mut writer.lock(), file_id, diagnostic) {
            error!("{e} while reporting: {diagnostic}");
        }
    }

    pub fn report_all<'a>(&self, file_id: usize, diagnostics: impl IntoIterator<Item = &'a Diagnostic>) {
        for diagnostic in diagnostics {
            self.report_error(file_id, diagnostic);
        }
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}
