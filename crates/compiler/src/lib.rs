//! Wisp Compiler: scanner plus single-pass Pratt compiler.
//!
//! There is no intermediate AST. [`compile`] drives a [`Scanner`] token by
//! token, emitting bytecode into a [`wisp_core::Chunk`] as it parses —
//! expression precedence, lexical scope, and jump targets are all resolved
//! in the same walk.

pub mod compiler;
pub mod error;
pub mod scanner;
pub mod token;

pub use compiler::compile;
pub use error::CompileError;
pub use scanner::Scanner;
pub use token::{Token, TokenKind};
