//! Declared types

use serde::{Deserialize, Serialize};

/// A type as written in source: a primitive, `nil` (return position only) or a record name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    Int,
    Double,
    Bool,
    Char,
    String,
    Matrix,
    Nil,
    Named(String),
}

impl Type {
    pub fn is_record(&self) -> bool {
        matches!(self, Type::Named(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Double)
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Double => write!(f, "double"),
            Type::Bool => write!(f, "bool"),
            Type::Char => write!(f, "char"),
            Type::String => write!(f, "string"),
            Type::Matrix => write!(f, "matrix"),
            Type::Nil => write!(f, "nil"),
            Type::Named(name) => write!(f, "{name}"),
        }
    }
}
