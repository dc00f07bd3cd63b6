//! Assembler for the Synacor architecture's instruction set: a line-
//! oriented tokenizer, a one-line-at-a-time assembler, and positional
//! diagnostics shared between the library and the `synasm` binary.

pub mod assemble;
pub mod diagnostics;
pub mod token;

pub use assemble::assemble;
pub use diagnostics::{Diagnostic, DiagnosticKind};
