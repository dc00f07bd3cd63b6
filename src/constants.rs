//! Named boundaries of the machine. Kept separate from the types that use
//! them so a reader can see the whole shape of the address space at a
//! glance.

use std::mem;

/// Width in bits of a single byte, spelled out for the constants below that
/// are derived from it rather than hard-coded.
pub const BYTE_WIDTH: u32 = 8;

/// Size in bytes of one [`crate::word::Word`] on the wire (§4.1: two bytes,
/// little-endian).
pub const WORD_BYTES: u32 = mem::size_of::<u16>() as u32;
pub const WORD_WIDTH: u32 = WORD_BYTES * BYTE_WIDTH;

/// Number of distinct values a Word's 15-bit domain can hold: `{0..32767}`.
pub const WORD_MODULUS: u32 = 1 << 15;

/// Largest value a Word may legally hold.
pub const WORD_MAX: u16 = (WORD_MODULUS - 1) as u16;

/// 15-bit mask applied after every arithmetic operation.
pub const WORD_MASK: u16 = (WORD_MODULUS - 1) as u16;

/// Number of general-purpose registers.
pub const REGISTER_COUNT: usize = 8;

/// Raw operand values `{0..32767}` decode as literals.
pub const LITERAL_MAX: u16 = WORD_MAX;

/// Raw operand values `{32768..32775}` decode as register references.
pub const REGISTER_BASE: u16 = 1 << 15;
pub const REGISTER_MAX: u16 = REGISTER_BASE + REGISTER_COUNT as u16 - 1;

/// Raw operand values at or above this are invalid (§3, Encoded operand).
pub const INVALID_OPERAND_MIN: u16 = REGISTER_MAX + 1;

/// Total addressable memory cells.
pub const ADDRESS_SPACE: usize = 32768;

/// The stack's base address is rounded up to this boundary past the end of
/// the loaded program image (§3, Stack).
pub const STACK_ALIGNMENT: usize = 8;

/// Number of distinct opcodes; any raw opcode word at or above this is
/// `WRONG_OPCODE` (§4.4).
pub const OPCODE_COUNT: u16 = 22;
