//! Expression AST nodes

use super::Spanned;
use serde::{Deserialize, Serialize};

/// Expression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    /// Integer literal, kept as written so range errors surface when evaluated
    IntLit(String),
    /// Double literal, kept as written
    DoubleLit(String),
    StringLit(String),
    CharLit(char),
    BoolLit(bool),
    Nil,

    /// Variable or dotted field path: `x`, `p.next.value`
    Path(Vec<Spanned<String>>),

    /// Record construction: `new T`
    New(Spanned<String>),

    /// Function call
    Call {
        func: Spanned<String>,
        args: Vec<Spanned<Expr>>,
    },

    /// Binary operation. The grammar nests these to the right.
    Binary {
        left: Box<Spanned<Expr>>,
        op: BinOp,
        right: Box<Spanned<Expr>>,
    },

    /// Prefix operation applied to the whole following expression
    Unary {
        op: UnOp,
        expr: Box<Spanned<Expr>>,
    },

    /// Matrix literal: `[1, 2; 3, 4]`
    Matrix(Vec<Vec<Spanned<Expr>>>),
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,

    // Elementwise matrix
    ElemMul,
    ElemDiv,
    ElemPow,

    // Comparison
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,

    // Logical
    And,
    Or,
}

impl BinOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge
        )
    }
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinOp::Add => write!(f, "+"),
            BinOp::Sub => write!(f, "-"),
            BinOp::Mul => write!(f, "*"),
            BinOp::Div => write!(f, "/"),
            BinOp::Mod => write!(f, "%"),
            BinOp::Pow => write!(f, "^"),
            BinOp::ElemMul => write!(f, ".*"),
            BinOp::ElemDiv => write!(f, "./"),
            BinOp::ElemPow => write!(f, ".^"),
            BinOp::Eq => write!(f, "=="),
            BinOp::Ne => write!(f, "!="),
            BinOp::Lt => write!(f, "<"),
            BinOp::Gt => write!(f, ">"),
            BinOp::Le => write!(f, "<="),
            BinOp::Ge => write!(f, ">="),
            BinOp::And => write!(f, "and"),
            BinOp::Or => write!(f, "or"),
        }
    }
}

/// Prefix operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    /// Logical `not`
    Not,
    /// Numeric `neg`
    Neg,
    /// Matrix transpose `~`
    Transpose,
}

impl std::fmt::Display for UnOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnOp::Not => write!(f, "not"),
            UnOp::Neg => write!(f, "neg"),
            UnOp::Transpose => write!(f, "~"),
        }
    }
}
