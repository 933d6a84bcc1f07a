//! Wisp VM: compiles and executes bytecode.
//!
//! [`Vm::interpret`] compiles source into a [`wisp_core::Chunk`] and runs it
//! on a stack machine. A single [`Vm`] can be reused across many calls — a
//! REPL keeps one alive for the whole session so globals and interned
//! strings persist between lines.

pub mod disassemble;
pub mod error;
pub mod vm;

pub use error::RuntimeError;
pub use vm::Vm;

use wisp_compiler::CompileError;

/// Why a call to [`Vm::interpret`] failed.
#[derive(Debug)]
pub enum InterpretError {
    Compile(Vec<CompileError>),
    Runtime(RuntimeError),
}

impl std::fmt::Display for InterpretError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterpretError::Compile(errors) => {
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{err}")?;
                }
                Ok(())
            }
            InterpretError::Runtime(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for InterpretError {}
