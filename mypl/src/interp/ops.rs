//! Operator dispatch on evaluated operands
//!
//! Both operands are already snapshots; nothing here touches the
//! environment or the heap.

use super::error::{ErrorKind, InterpResult, RuntimeError};
use super::value::Value;
use crate::ast::{BinOp, UnOp};
use std::cmp::Ordering;

pub fn binary(op: BinOp, left: &Value, right: &Value) -> InterpResult<Value> {
    use Value::*;

    let result = match (op, left, right) {
        // Nil absorbs into string concatenation
        (BinOp::Add, Nil, Nil) => Nil,
        (BinOp::Add, Nil, v @ (Str(_) | Char(_))) | (BinOp::Add, v @ (Str(_) | Char(_)), Nil) => {
            v.clone()
        }
        (BinOp::Add, Str(_) | Char(_), Str(_) | Char(_)) => {
            Value::string(format!("{left}{right}"))
        }

        (BinOp::Add, Int(a), Int(b)) => Int(a.wrapping_add(*b)),
        (BinOp::Sub, Int(a), Int(b)) => Int(a.wrapping_sub(*b)),
        (BinOp::Mul, Int(a), Int(b)) => Int(a.wrapping_mul(*b)),
        (BinOp::Div, Int(a), Int(b)) => {
            if *b == 0 {
                return Err(RuntimeError::division_by_zero());
            }
            Int(a.wrapping_div(*b))
        }
        (BinOp::Mod, Int(a), Int(b)) => {
            if *b == 0 {
                return Err(RuntimeError::division_by_zero());
            }
            Int(a.wrapping_rem(*b))
        }
        (BinOp::Pow, Int(a), Int(b)) => Int(int_pow(*a, *b)?),

        (BinOp::Add, Double(a), Double(b)) => Double(a + b),
        (BinOp::Sub, Double(a), Double(b)) => Double(a - b),
        (BinOp::Mul, Double(a), Double(b)) => Double(a * b),
        (BinOp::Div, Double(a), Double(b)) => Double(a / b),
        (BinOp::Pow, Double(a), Int(b)) => Double(match i32::try_from(*b) {
            Ok(exp) => a.powi(exp),
            Err(_) => a.powf(*b as f64),
        }),

        (BinOp::Add, Matrix(a), Matrix(b)) => Value::matrix(a.zip_with(b, "+", |x, y| x + y)?),
        (BinOp::Sub, Matrix(a), Matrix(b)) => Value::matrix(a.zip_with(b, "-", |x, y| x - y)?),
        (BinOp::Mul, Matrix(a), Matrix(b)) => Value::matrix(a.matmul(b)?),
        (BinOp::ElemMul, Matrix(a), Matrix(b)) => {
            Value::matrix(a.zip_with(b, ".*", |x, y| x * y)?)
        }
        (BinOp::ElemDiv, Matrix(a), Matrix(b)) => {
            Value::matrix(a.zip_with(b, "./", |x, y| x / y)?)
        }
        (BinOp::ElemPow, Matrix(a), Matrix(b)) => {
            Value::matrix(a.zip_with(b, ".^", f64::powf)?)
        }

        // Scaling works with the scalar on either side; division only as matrix / scalar
        (BinOp::Mul, Matrix(m), s @ (Int(_) | Double(_)))
        | (BinOp::Mul, s @ (Int(_) | Double(_)), Matrix(m)) => {
            let k = scalar(s)?;
            Value::matrix(m.map(|x| x * k))
        }
        (BinOp::Div, Matrix(m), s @ (Int(_) | Double(_))) => {
            let k = scalar(s)?;
            Value::matrix(m.map(|x| x / k))
        }
        (BinOp::Mod, Matrix(m), Int(n)) => Value::matrix(m.rem_int(*n)?),
        (BinOp::Pow, Matrix(m), Int(n)) => Value::matrix(m.pow(*n)?),

        (BinOp::And, Bool(a), Bool(b)) => Bool(*a && *b),
        (BinOp::Or, Bool(a), Bool(b)) => Bool(*a || *b),

        (BinOp::Eq, _, _) => Bool(equals(left, right)?),
        (BinOp::Ne, _, _) => Bool(!equals(left, right)?),
        (BinOp::Lt, _, _) => Bool(compare(op, left, right)? == Ordering::Less),
        (BinOp::Le, _, _) => Bool(compare(op, left, right)? != Ordering::Greater),
        (BinOp::Gt, _, _) => Bool(compare(op, left, right)? == Ordering::Greater),
        (BinOp::Ge, _, _) => Bool(compare(op, left, right)? != Ordering::Less),

        _ => return Err(unsupported(op, left, right)),
    };
    Ok(result)
}

pub fn unary(op: UnOp, value: &Value) -> InterpResult<Value> {
    match (op, value) {
        (UnOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnOp::Neg, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
        (UnOp::Neg, Value::Double(x)) => Ok(Value::Double(-x)),
        (UnOp::Transpose, Value::Matrix(m)) => Ok(Value::matrix(m.transpose())),
        (UnOp::Not, v) => Err(RuntimeError::type_error("bool", v.type_name())),
        (UnOp::Neg, v) => Err(RuntimeError::type_error("int or double", v.type_name())),
        (UnOp::Transpose, v) => Err(RuntimeError::type_error("matrix", v.type_name())),
    }
}

/// `==` semantics. Nil equals only nil; records compare by handle.
fn equals(left: &Value, right: &Value) -> InterpResult<bool> {
    match (left, right) {
        (Value::Matrix(_), _) | (_, Value::Matrix(_)) => {
            Err(unsupported(BinOp::Eq, left, right))
        }
        (Value::Nil, _) | (_, Value::Nil) => Ok(left.is_nil() && right.is_nil()),
        _ if std::mem::discriminant(left) == std::mem::discriminant(right) => Ok(left == right),
        _ => Err(unsupported(BinOp::Eq, left, right)),
    }
}

fn compare(op: BinOp, left: &Value, right: &Value) -> InterpResult<Ordering> {
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
        (Value::Char(a), Value::Char(b)) => Some(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => return Err(unsupported(op, left, right)),
    };
    // NaN compares false under every ordering operator
    Ok(ordering.unwrap_or(match op {
        BinOp::Lt | BinOp::Le => Ordering::Greater,
        _ => Ordering::Less,
    }))
}

/// Square-and-multiply with wrapping. Exponent 0 yields 1, an extension of
/// the `exp >= 1` range the language defines; negative exponents are errors.
fn int_pow(base: i64, exp: i64) -> InterpResult<i64> {
    if exp < 0 {
        return Err(RuntimeError::new(
            ErrorKind::InvalidNumber,
            format!("negative exponent {exp} for int power"),
        ));
    }
    let (mut result, mut base, mut exp) = (1i64, base, exp as u64);
    while exp > 0 {
        if exp & 1 == 1 {
            result = result.wrapping_mul(base);
        }
        base = base.wrapping_mul(base);
        exp >>= 1;
    }
    Ok(result)
}

fn scalar(v: &Value) -> InterpResult<f64> {
    v.as_double()
        .ok_or_else(|| RuntimeError::type_error("int or double", v.type_name()))
}

fn unsupported(op: BinOp, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::unsupported_operands(&op.to_string(), left.type_name(), right.type_name())
}

/// Shape check used by matrix literals
pub fn matrix_from_rows(rows: Vec<Vec<f64>>) -> InterpResult<Value> {
    super::matrix::Matrix::from_rows(rows).map(Value::matrix)
}
