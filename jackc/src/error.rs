//! Result and errors.
use std::{fmt, io};

use crate::lex::{LexError, Span};

pub type JackResult<T> = std::result::Result<T, JackError>;

/// Fatal compilation error.
///
/// Nothing is recovered; the first error aborts the class being compiled.
#[derive(Debug, thiserror::Error)]
pub enum JackError {
    #[error("lexical error: {0}")]
    Lex(#[from] LexError),
    /// Token doesn't fit the grammar production being recognised.
    #[error("syntax error: {0}")]
    Syntax(Diagnostic),
    /// Identifier used as a variable without a declaration in scope.
    #[error("resolution error: {0}")]
    Resolution(Diagnostic),
    /// Term that matches none of the expression forms.
    #[error("structural error: {0}")]
    Structural(Diagnostic),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl JackError {
    /// Source position diagnostic, when the error has one.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Self::Syntax(diag) | Self::Resolution(diag) | Self::Structural(diag) => Some(diag),
            Self::Lex(_) | Self::Io(_) => None,
        }
    }
}

/// Error message anchored to a location in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    /// One-based line number.
    pub line: usize,
    /// One-based column number.
    pub column: usize,
    /// The full source line the error points into, without line ending.
    pub source_line: String,
}

impl Diagnostic {
    pub fn new(source_code: &str, span: Span, message: impl ToString) -> Self {
        let (line, column) = span.line_column(source_code);
        let (source_line, _) = span.surrounding_line(source_code);

        Self {
            message: message.to_string(),
            line,
            column,
            source_line: source_line.trim_end_matches(&['\r', '\n'][..]).to_owned(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            message,
            line,
            column,
            source_line,
        } = self;
        let marker = " ".repeat(column.saturating_sub(1));

        writeln!(f, "{line}:{column}: {message}")?;
        writeln!(f, "{source_line}")?;
        write!(f, "{marker}^")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_diagnostic_points_at_token() {
        const CODE: &str = "class Main {\n  let x = ;\n}";

        let diag = Diagnostic::new(CODE, Span::new(23, 1), "expected expression");
        assert_eq!(diag.line, 2);
        assert_eq!(diag.column, 11);
        assert_eq!(diag.source_line, "  let x = ;");
        assert_eq!(
            diag.to_string(),
            "2:11: expected expression\n  let x = ;\n          ^"
        );
    }
}
