//! Typed, host-facing errors (§4.12). These never appear inside the
//! instruction loop — machine-level faults are [`crate::flags::Flags`]
//! lanes, part of the serialized state. `LoadError` covers the boundary
//! where a byte stream handed to the machine from outside turns out to be
//! malformed before a single instruction has run.

use thiserror::Error;

/// Raised by [`crate::engine::Machine::load_program`] and
/// [`crate::serialize::load_state`] when the input byte stream cannot
/// possibly represent a valid image.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("program image is {len} bytes, larger than the {max}-byte address space")]
    ProgramTooLarge { len: usize, max: usize },

    #[error("state dump is {actual} bytes, expected exactly {expected}")]
    WrongStateLength { expected: usize, actual: usize },
}
