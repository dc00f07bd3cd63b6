//! Core of a virtual machine for the Synacor architecture: a 15-bit word
//! domain, eight registers, a flat 32768-word memory, and a 22-opcode
//! instruction set, together with the machinery (observers, pause/resume,
//! state serialization) needed to run it as more than a toy interpreter.

pub mod constants;
pub mod engine;
pub mod error;
pub mod flags;
pub mod instruction;
pub mod io;
pub mod memory;
pub mod observer;
pub mod operand;
pub mod pause;
pub mod serialize;
pub mod word;

pub use engine::{Machine, RunState};
pub use error::LoadError;
pub use flags::Flags;
pub use instruction::Opcode;
pub use memory::Memory;
pub use word::{Address, Word};
