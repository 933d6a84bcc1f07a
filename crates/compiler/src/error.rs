//! Compile-time diagnostics.

use std::fmt;

#[derive(Debug, Clone)]
pub struct CompileError {
    pub line: u32,
    /// `"at end"`, `"at 'xyz'"`, or empty for an already-located scanner error.
    pub at: String,
    pub message: String,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.at.is_empty() {
            write!(f, "[line {}] Error: {}", self.line, self.message)
        } else {
            write!(f, "[line {}] Error {}: {}", self.line, self.at, self.message)
        }
    }
}

impl std::error::Error for CompileError {}
