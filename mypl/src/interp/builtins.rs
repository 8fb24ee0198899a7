//! Built-in functions
//!
//! Dispatched by name ahead of user functions. They run in the caller's
//! scope and push no call frame.

use super::error::{ErrorKind, InterpResult, RuntimeError};
use super::eval::Interpreter;
use super::matrix::Matrix;
use super::value::Value;

/// Names handled by [`Interpreter::call_builtin`]
pub const BUILTIN_NAMES: &[&str] = &[
    "print",
    "read",
    "length",
    "get",
    "stoi",
    "stod",
    "itos",
    "dtos",
    "m_print",
    "m_get",
    "m_singleton",
];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}

impl Interpreter {
    pub(super) fn call_builtin(&mut self, name: &str, args: Vec<Value>) -> InterpResult<Value> {
        match name {
            "print" => {
                let [value] = expect_args(name, args)?;
                self.write_output(&unescape(&value.to_string()))?;
                Ok(Value::Nil)
            }
            "read" => {
                let [] = expect_args(name, args)?;
                Ok(Value::string(self.read_line()?))
            }
            "length" => {
                let [s] = expect_args(name, args)?;
                Ok(Value::Int(as_str(&s)?.chars().count() as i64))
            }
            "get" => {
                let [index, s] = expect_args(name, args)?;
                let index = as_int(&index)?;
                let s = as_str(&s)?;
                let len = s.chars().count();
                usize::try_from(index)
                    .ok()
                    .and_then(|i| s.chars().nth(i))
                    .map(Value::Char)
                    .ok_or_else(|| RuntimeError::index_out_of_bounds(index, len))
            }
            "stoi" => {
                let [s] = expect_args(name, args)?;
                let text = as_str(&s)?;
                text.trim()
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| RuntimeError::invalid_number(text, "int"))
            }
            "stod" => {
                let [s] = expect_args(name, args)?;
                let text = as_str(&s)?;
                text.trim()
                    .parse::<f64>()
                    .map(Value::Double)
                    .map_err(|_| RuntimeError::invalid_number(text, "double"))
            }
            "itos" => {
                let [n] = expect_args(name, args)?;
                Ok(Value::string(as_int(&n)?.to_string()))
            }
            "dtos" => {
                let [x] = expect_args(name, args)?;
                let x = match x {
                    Value::Double(x) => x,
                    other => return Err(RuntimeError::type_error("double", other.type_name())),
                };
                Ok(Value::string(format!("{x:.6}")))
            }
            "m_print" => {
                let [m] = expect_args(name, args)?;
                let text = as_matrix(&m)?.to_print_string();
                self.write_output(&text)?;
                Ok(Value::Nil)
            }
            "m_get" => {
                let [m, row, col] = expect_args(name, args)?;
                let m = as_matrix(&m)?;
                let row = checked_index(as_int(&row)?, m.rows())?;
                let col = checked_index(as_int(&col)?, m.cols())?;
                m.get(row, col)
                    .map(Value::Double)
                    .ok_or_else(|| RuntimeError::internal("matrix index check out of sync"))
            }
            "m_singleton" => {
                let [value, rows, cols] = expect_args(name, args)?;
                let fill = value
                    .as_double()
                    .ok_or_else(|| RuntimeError::type_error("double", value.type_name()))?;
                let rows = dimension(as_int(&rows)?)?;
                let cols = dimension(as_int(&cols)?)?;
                Ok(Value::matrix(Matrix::filled(fill, rows, cols)?))
            }
            _ => Err(RuntimeError::undefined_function(name)),
        }
    }
}

/// Replace the two-character sequences `\n` and `\t` with the real characters
fn unescape(text: &str) -> String {
    text.replace("\\n", "\n").replace("\\t", "\t")
}

fn expect_args<const N: usize>(name: &str, args: Vec<Value>) -> InterpResult<[Value; N]> {
    let got = args.len();
    args.try_into()
        .map_err(|_| RuntimeError::arity_mismatch(name, N, got))
}

fn as_int(v: &Value) -> InterpResult<i64> {
    v.as_int()
        .ok_or_else(|| RuntimeError::type_error("int", v.type_name()))
}

fn as_str(v: &Value) -> InterpResult<&str> {
    v.as_str()
        .ok_or_else(|| RuntimeError::type_error("string", v.type_name()))
}

fn as_matrix(v: &Value) -> InterpResult<&Matrix> {
    v.as_matrix()
        .ok_or_else(|| RuntimeError::type_error("matrix", v.type_name()))
}

fn checked_index(index: i64, len: usize) -> InterpResult<usize> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or_else(|| RuntimeError::index_out_of_bounds(index, len))
}

fn dimension(n: i64) -> InterpResult<usize> {
    usize::try_from(n).map_err(|_| {
        RuntimeError::new(
            ErrorKind::InvalidNumber,
            format!("matrix dimension must be non-negative, got {n}"),
        )
    })
}
