//! MyPL Interpreter Library
//!
//! Lexer, parser, static checker and tree-walking evaluator for MyPL,
//! a small imperative language with records and matrices.

pub mod ast;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod types;
pub mod util;

pub use ast::Span;
pub use error::{CompileError, Result};
