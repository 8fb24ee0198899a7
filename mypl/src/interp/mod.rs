//! Tree-walking interpreter for MyPL programs

mod builtins;
mod env;
mod error;
mod eval;
mod heap;
mod matrix;
mod ops;
mod output;
mod value;

pub use builtins::{BUILTIN_NAMES, is_builtin};
pub use env::{EnvId, Environment};
pub use error::{ErrorKind, InterpResult, RuntimeError};
pub use eval::{ControlFlow, DEFAULT_MAX_DEPTH, Interpreter};
pub use heap::{Heap, ObjHandle, Record};
pub use matrix::{Matrix, format_general};
pub use output::Output;
pub use value::Value;

/// Process exit status for the value `main` returned. Ints outside the
/// `i32` range saturate.
pub fn exit_code(result: &Value) -> i32 {
    match result {
        Value::Int(n) => (*n).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
        _ => 0,
    }
}
