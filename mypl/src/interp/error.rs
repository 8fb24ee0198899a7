//! Runtime errors for the interpreter

use crate::ast::Span;
use std::fmt;

/// Runtime error during interpretation. Always fatal: it unwinds to the
/// top of the program and ends the run.
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    /// Innermost source location known when the error surfaced
    pub span: Option<Span>,
}

/// Kinds of runtime errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Undefined variable
    UndefinedVariable,
    /// Undefined function
    UndefinedFunction,
    /// `new` on an undeclared record type
    UndefinedType,
    /// Field not present on a record
    UndefinedField,
    /// Operand or argument of an unexpected type
    TypeError,
    /// Argument count mismatch
    ArityMismatch,
    /// Integer division or modulo by zero
    DivisionByZero,
    /// Matrix shapes incompatible with the operator
    DimensionMismatch,
    /// Index out of bounds
    IndexOutOfBounds,
    /// Literal or conversion input that is not a valid number
    InvalidNumber,
    /// Field assignment through a nil reference
    NilDereference,
    /// Stack overflow (deep recursion)
    StackOverflow,
    /// IO error
    IoError,
    /// Interpreter invariant broken (e.g. dangling heap handle)
    Internal,
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        RuntimeError {
            kind,
            message: message.into(),
            span: None,
        }
    }

    /// Attach a location unless a more precise one is already present
    pub fn at(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    pub fn undefined_variable(name: &str) -> Self {
        Self::new(ErrorKind::UndefinedVariable, format!("undefined variable: {name}"))
    }

    pub fn undefined_function(name: &str) -> Self {
        Self::new(ErrorKind::UndefinedFunction, format!("undefined function: {name}"))
    }

    pub fn undefined_type(name: &str) -> Self {
        Self::new(ErrorKind::UndefinedType, format!("undefined type: {name}"))
    }

    pub fn undefined_field(field: &str) -> Self {
        Self::new(ErrorKind::UndefinedField, format!("record has no field: {field}"))
    }

    pub fn type_error(expected: &str, got: &str) -> Self {
        Self::new(
            ErrorKind::TypeError,
            format!("type error: expected {expected}, got {got}"),
        )
    }

    pub fn unsupported_operands(op: &str, left: &str, right: &str) -> Self {
        Self::new(
            ErrorKind::TypeError,
            format!("operator '{op}' does not apply to {left} and {right}"),
        )
    }

    pub fn arity_mismatch(name: &str, expected: usize, got: usize) -> Self {
        Self::new(
            ErrorKind::ArityMismatch,
            format!("function {name} expects {expected} argument(s), got {got}"),
        )
    }

    pub fn division_by_zero() -> Self {
        Self::new(ErrorKind::DivisionByZero, "division by zero")
    }

    pub fn dimension_mismatch(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::DimensionMismatch, msg)
    }

    pub fn index_out_of_bounds(index: i64, len: usize) -> Self {
        Self::new(
            ErrorKind::IndexOutOfBounds,
            format!("index {index} out of bounds for length {len}"),
        )
    }

    pub fn invalid_number(text: &str, target: &str) -> Self {
        Self::new(
            ErrorKind::InvalidNumber,
            format!("cannot convert {text:?} to {target}"),
        )
    }

    pub fn nil_dereference(field: &str) -> Self {
        Self::new(
            ErrorKind::NilDereference,
            format!("cannot assign field '{field}' through a nil reference"),
        )
    }

    pub fn stack_overflow() -> Self {
        Self::new(ErrorKind::StackOverflow, "stack overflow: too deep recursion")
    }

    pub fn io_error(msg: &str) -> Self {
        Self::new(ErrorKind::IoError, format!("IO error: {msg}"))
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, msg)
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) => write!(f, "Runtime error at {span}: {}", self.message),
            None => write!(f, "Runtime error: {}", self.message),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Result type for interpreter operations
pub type InterpResult<T> = Result<T, RuntimeError>;
