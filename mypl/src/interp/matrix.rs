//! Dense row-major matrices of doubles
//!
//! Matrices are immutable snapshots: every operation builds a new one.

use super::error::{ErrorKind, InterpResult, RuntimeError};
use std::fmt;

/// Significant digits used when printing matrix entries
const PRECISION: usize = 6;

/// Largest number of entries a single matrix may hold
pub const MAX_ENTRIES: usize = 1 << 26;

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Build from rows, requiring every row to have the same length.
    /// A single empty row is the empty matrix.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> InterpResult<Self> {
        if rows.len() == 1 && rows[0].is_empty() {
            return Ok(Matrix {
                rows: 0,
                cols: 0,
                data: Vec::new(),
            });
        }
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(RuntimeError::dimension_mismatch(format!(
                    "matrix row {i} has {} column(s), expected {cols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Matrix {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// A `rows` x `cols` matrix with every entry set to `value`
    pub fn filled(value: f64, rows: usize, cols: usize) -> InterpResult<Self> {
        let len = entry_count(rows, cols)?;
        Ok(Matrix {
            rows,
            cols,
            data: vec![value; len],
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col).copied()
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn shape(&self) -> String {
        format!("{}x{}", self.rows, self.cols)
    }

    pub fn transpose(&self) -> Matrix {
        let mut data = Vec::with_capacity(self.data.len());
        for c in 0..self.cols {
            for r in 0..self.rows {
                data.push(self.data[r * self.cols + c]);
            }
        }
        Matrix {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combine two same-shaped matrices entry by entry
    pub fn zip_with(
        &self,
        other: &Matrix,
        op: &str,
        f: impl Fn(f64, f64) -> f64,
    ) -> InterpResult<Matrix> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(RuntimeError::dimension_mismatch(format!(
                "matrix dimensions must match for '{op}': {} and {}",
                self.shape(),
                other.shape()
            )));
        }
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    /// Matrix product
    pub fn matmul(&self, other: &Matrix) -> InterpResult<Matrix> {
        if self.cols != other.rows {
            return Err(RuntimeError::dimension_mismatch(format!(
                "inner dimensions must match for '*': {} and {}",
                self.shape(),
                other.shape()
            )));
        }
        let mut data = vec![0.0; entry_count(self.rows, other.cols)?];
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                for j in 0..other.cols {
                    data[i * other.cols + j] += a * other.data[k * other.cols + j];
                }
            }
        }
        Ok(Matrix {
            rows: self.rows,
            cols: other.cols,
            data,
        })
    }

    /// Power by squaring. Needs a square matrix and `exp >= 1`.
    pub fn pow(&self, exp: i64) -> InterpResult<Matrix> {
        if self.rows != self.cols {
            return Err(RuntimeError::dimension_mismatch(format!(
                "'^' needs a square matrix, got {}",
                self.shape()
            )));
        }
        if exp < 1 {
            return Err(RuntimeError::dimension_mismatch(format!(
                "matrix exponent must be at least 1, got {exp}"
            )));
        }
        let mut result: Option<Matrix> = None;
        let mut base = self.clone();
        let mut exp = exp as u64;
        loop {
            if exp & 1 == 1 {
                result = Some(match result {
                    Some(acc) => acc.matmul(&base)?,
                    None => base.clone(),
                });
            }
            exp >>= 1;
            if exp == 0 {
                break;
            }
            base = base.matmul(&base)?;
        }
        result.ok_or_else(|| RuntimeError::internal("matrix power produced no result"))
    }

    /// Entries truncated to integers, reduced modulo `divisor`, cast back
    pub fn rem_int(&self, divisor: i64) -> InterpResult<Matrix> {
        if divisor == 0 {
            return Err(RuntimeError::division_by_zero());
        }
        Ok(self.map(|v| (v as i64).wrapping_rem(divisor) as f64))
    }

    /// Text written by `m_print`: each row on its own line after a leading
    /// newline, every entry followed by a space
    pub fn to_print_string(&self) -> String {
        let mut out = String::new();
        for r in 0..self.rows {
            out.push('\n');
            for &v in self.row(r) {
                out.push_str(&format_general(v));
                out.push(' ');
            }
        }
        out.push('\n');
        out
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for r in 0..self.rows {
            if r > 0 {
                write!(f, "; ")?;
            }
            for (c, &v) in self.row(r).iter().enumerate() {
                if c > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", format_general(v))?;
            }
        }
        write!(f, "]")
    }
}

/// `rows * cols`, refusing shapes that overflow or exceed `MAX_ENTRIES`
fn entry_count(rows: usize, cols: usize) -> InterpResult<usize> {
    rows.checked_mul(cols)
        .filter(|&n| n <= MAX_ENTRIES)
        .ok_or_else(|| {
            RuntimeError::new(
                ErrorKind::InvalidNumber,
                format!("matrix of {rows}x{cols} entries is too large"),
            )
        })
}

/// Shortest general notation with six significant digits (`%g`)
pub fn format_general(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let sci = format!("{:.*e}", PRECISION - 1, x);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= PRECISION as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exp.abs())
    } else {
        let decimals = (PRECISION as i32 - 1 - exp) as usize;
        trim_fraction(&format!("{x:.decimals$}")).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
