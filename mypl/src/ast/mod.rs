//! Abstract Syntax Tree definitions

mod expr;
mod span;
mod types;

pub use expr::*;
pub use span::*;
pub use types::*;

use serde::{Deserialize, Serialize};

/// A program is a sequence of type and function declarations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub items: Vec<Item>,
}

/// Top-level item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Item {
    TypeDecl(TypeDecl),
    FunDecl(FunDecl),
}

/// Record type declaration: `type Name var f = e ... end`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: Spanned<String>,
    pub fields: Vec<VarDecl>,
    pub span: Span,
}

/// Function declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunDecl {
    pub name: Spanned<String>,
    pub params: Vec<Param>,
    pub ret_ty: Spanned<Type>,
    pub body: Vec<Spanned<Stmt>>,
    pub span: Span,
}

/// Function parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: Spanned<String>,
    pub ty: Spanned<Type>,
}

/// `var name[: ty] = init`, used both as a statement and as a record field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: Spanned<String>,
    pub ty: Option<Spanned<Type>>,
    pub init: Spanned<Expr>,
}

/// One guarded arm of an if/elseif chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CondBranch {
    pub cond: Spanned<Expr>,
    pub body: Vec<Spanned<Stmt>>,
}

/// Statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    VarDecl(VarDecl),

    /// Assignment to a name or dotted field path
    Assign {
        target: Vec<Spanned<String>>,
        value: Spanned<Expr>,
    },

    /// Call whose result is discarded
    Call {
        func: Spanned<String>,
        args: Vec<Spanned<Expr>>,
    },

    If {
        branches: Vec<CondBranch>,
        else_body: Option<Vec<Spanned<Stmt>>>,
    },

    While {
        cond: Spanned<Expr>,
        body: Vec<Spanned<Stmt>>,
    },

    For {
        var: Spanned<String>,
        start: Spanned<Expr>,
        end: Spanned<Expr>,
        body: Vec<Spanned<Stmt>>,
    },

    Return(Spanned<Expr>),
}

impl Program {
    pub fn functions(&self) -> impl Iterator<Item = &FunDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::FunDecl(f) => Some(f),
            Item::TypeDecl(_) => None,
        })
    }

    pub fn type_decls(&self) -> impl Iterator<Item = &TypeDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::TypeDecl(t) => Some(t),
            Item::FunDecl(_) => None,
        })
    }
}
