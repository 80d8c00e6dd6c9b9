//! Error types for compilation and export

use serde::{Deserialize, Serialize};
use thiserror::Error;
use typst::diag::{Severity, SourceDiagnostic};
use typst::syntax::Source;

/// A diagnostic with a position in the generated source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileError {
    pub message: String,
    /// Line number (1-indexed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Column number (1-indexed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub severity: ErrorSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    Error,
    Warning,
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Compilation failed: {}", summarize(.0))]
    Compile(Vec<CompileError>),

    #[error("Compilation timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid asset encoding for '{0}': {1}")]
    Asset(String, String),

    #[error("Path security violation: {0}")]
    PathSecurity(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Document has no pages")]
    EmptyDocument,

    #[error("Compilation task failed: {0}")]
    TaskFailed(String),
}

fn summarize(errors: &[CompileError]) -> String {
    match errors.first() {
        Some(first) if errors.len() > 1 => {
            format!("{} (and {} more)", first, errors.len() - 1)
        }
        Some(first) => first.to_string(),
        None => "unknown error".to_string(),
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(f, "{}:{}: {}", line, column, self.message)?,
            _ => write!(f, "{}", self.message)?,
        }
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {})", hint)?;
        }
        Ok(())
    }
}

impl CompileError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
            hint: None,
            severity: ErrorSeverity::Error,
        }
    }

    pub fn with_location(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn as_warning(mut self) -> Self {
        self.severity = ErrorSeverity::Warning;
        self
    }

    /// Convert a Typst diagnostic, resolving its span against `source` when
    /// the span points into that file
    pub fn from_diagnostic(diag: &SourceDiagnostic, source: Option<&Source>) -> Self {
        let mut error = CompileError::new(diag.message.to_string());

        if !diag.hints.is_empty() {
            let hint = diag
                .hints
                .iter()
                .map(|h| h.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            error = error.with_hint(hint);
        }

        if let Some(source) = source.filter(|s| diag.span.id() == Some(s.id())) {
            let location = source.range(diag.span).and_then(|range| {
                let line = source.byte_to_line(range.start)?;
                let column = source.byte_to_column(range.start)?;
                Some((line + 1, column + 1))
            });
            if let Some((line, column)) = location {
                error = error.with_location(line, column);
            }
        }

        match diag.severity {
            Severity::Error => error,
            Severity::Warning => error.as_warning(),
        }
    }
}

/// Split diagnostics into errors and warnings
pub fn categorize_diagnostics(
    diagnostics: &[SourceDiagnostic],
    source: Option<&Source>,
) -> (Vec<CompileError>, Vec<CompileError>) {
    diagnostics
        .iter()
        .map(|diag| CompileError::from_diagnostic(diag, source))
        .partition(|e| e.severity == ErrorSeverity::Error)
}
