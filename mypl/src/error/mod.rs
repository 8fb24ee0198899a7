//! Error types and reporting

use crate::ast::Span;
use crate::interp::RuntimeError;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, CompileError>;

/// Error raised before a program starts running
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Lexer error at {span}: {message}")]
    Lexer { message: String, span: Span },

    #[error("Parser error at {span}: {message}")]
    Parser { message: String, span: Span },

    #[error("Type error at {span}: {message}")]
    Type { message: String, span: Span },

    #[error("IO error: {message}")]
    Io { message: String },
}

impl CompileError {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self::Lexer {
            message: message.into(),
            span,
        }
    }

    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        Self::Parser {
            message: message.into(),
            span,
        }
    }

    pub fn type_error(message: impl Into<String>, span: Span) -> Self {
        Self::Type {
            message: message.into(),
            span,
        }
    }

    pub fn io_error(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Lexer { span, .. } | Self::Parser { span, .. } | Self::Type { span, .. } => {
                Some(*span)
            }
            Self::Io { .. } => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Lexer { message, .. }
            | Self::Parser { message, .. }
            | Self::Type { message, .. }
            | Self::Io { message } => message,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Lexer { .. } => "Lexer",
            Self::Parser { .. } => "Parser",
            Self::Type { .. } => "Type",
            Self::Io { .. } => "IO",
        }
    }
}

impl From<std::io::Error> for CompileError {
    fn from(e: std::io::Error) -> Self {
        CompileError::io_error(e.to_string())
    }
}

/// Report a compile error with ariadne
pub fn report_error(filename: &str, source: &str, error: &CompileError) -> std::io::Result<()> {
    emit(filename, source, error.kind(), error.message(), error.span())
}

/// Report a runtime error with ariadne
pub fn report_runtime_error(
    filename: &str,
    source: &str,
    error: &RuntimeError,
) -> std::io::Result<()> {
    emit(filename, source, "Runtime", &error.message, error.span)
}

fn emit(
    filename: &str,
    source: &str,
    kind: &str,
    message: &str,
    span: Option<Span>,
) -> std::io::Result<()> {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    match span {
        Some(span) => Report::build(ReportKind::Error, (filename, span.start..span.end))
            .with_message(format!("{kind} error"))
            .with_label(
                Label::new((filename, span.start..span.end))
                    .with_message(message)
                    .with_color(Color::Red),
            )
            .finish()
            .eprint((filename, Source::from(source))),
        None => Report::build(ReportKind::Error, (filename, 0..0))
            .with_message(format!("{kind} error: {message}"))
            .finish()
            .eprint((filename, Source::from(source))),
    }
}
