//! Destination for text written by print built-ins.
//!
//! Native runs write to stdout; tests capture into a buffer.

use super::error::{InterpResult, RuntimeError};
use std::io::Write;

#[derive(Debug, Default)]
pub enum Output {
    /// Writes to stdout (default)
    #[default]
    Stdout,
    /// Captures everything written
    Buffer(String),
}

impl Output {
    pub fn buffer() -> Self {
        Output::Buffer(String::new())
    }

    /// Write text as-is. Stdout is flushed so prompts appear before `read()`.
    pub fn write(&mut self, text: &str) -> InterpResult<()> {
        match self {
            Output::Stdout => {
                let mut out = std::io::stdout().lock();
                out.write_all(text.as_bytes())
                    .and_then(|_| out.flush())
                    .map_err(|e| RuntimeError::io_error(&e.to_string()))
            }
            Output::Buffer(buf) => {
                buf.push_str(text);
                Ok(())
            }
        }
    }

    /// Captured text; empty for stdout
    pub fn captured(&self) -> &str {
        match self {
            Output::Stdout => "",
            Output::Buffer(buf) => buf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_captures_in_order() {
        let mut out = Output::buffer();
        out.write("hello").unwrap();
        out.write(", world\n").unwrap();
        assert_eq!(out.captured(), "hello, world\n");
    }

    #[test]
    fn test_stdout_captures_nothing() {
        let out = Output::default();
        assert_eq!(out.captured(), "");
    }
}
