//! Positional assembler diagnostics (§4.9, §4.12).

use std::fmt;
use thiserror::Error;

/// One of the three diagnostic categories the tokenizer/assembler can
/// raise for a single line.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum DiagnosticKind {
    UnknownMnemonic(String),
    BadOperand(String),
    TooManyArguments,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::UnknownMnemonic(text) => write!(f, "unknown mnemonic \"{}\"", text),
            DiagnosticKind::BadOperand(text) => write!(f, "bad operand \"{}\"", text),
            DiagnosticKind::TooManyArguments => write!(f, "too many arguments"),
        }
    }
}

/// A single diagnostic, positioned at a 1-based line and column with a
/// span width so the renderer can underline the offending token.
#[derive(Error, Clone, Eq, PartialEq, Debug)]
#[error("{file}:{line}:{column}: {kind}")]
pub struct Diagnostic {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub span: usize,
    pub source_line: String,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(
        file: &str,
        line: usize,
        column: usize,
        span: usize,
        source_line: &str,
        kind: DiagnosticKind,
    ) -> Diagnostic {
        Diagnostic {
            file: file.to_owned(),
            line,
            column,
            span: span.max(1),
            source_line: source_line.to_owned(),
            kind,
        }
    }

    /// Renders the diagnostic as the offending line with a caret/tilde
    /// underline beneath the offending token, e.g.:
    ///
    /// ```text
    /// program.asm:3:5: unknown mnemonic "jnz"
    ///     jnz r0 10
    ///     ^~~
    /// ```
    pub fn render(&self) -> String {
        let mut underline = String::with_capacity(self.column - 1 + self.span);
        for _ in 1..self.column {
            underline.push(' ');
        }
        underline.push('^');
        for _ in 1..self.span {
            underline.push('~');
        }
        format!(
            "{}:{}:{}: {}\n{}\n{}",
            self.file, self.line, self.column, self.kind, self.source_line, underline
        )
    }
}
