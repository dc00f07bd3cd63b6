//! The machine's fault/status bitset (§3, §7). Independent lanes — more
//! than one can be set by a single fault.

use bitflags::bitflags;

bitflags! {
    /// Status lanes observed by the run loop and persisted as part of the
    /// serialized machine state (§4.7).
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
    pub struct Flags: u8 {
        /// The run loop must stop; set by `HALT` and by a clean `RET` on
        /// an empty stack.
        const HALTED           = 0b0000_0001;
        /// A fault occurred; the run loop stops after the current
        /// instruction completes.
        const ERROR            = 0b0000_0010;
        /// An operand decoded to the invalid range (`>= 32776`), or a
        /// memory index fell outside `{0..32767}`.
        const BAD_INTEGER      = 0b0000_0100;
        /// `POP` (or the implicit pop inside `RET`'s bookkeeping) was
        /// attempted with `stack_top == stack_base`.
        const STACK_UNDERFLOW  = 0b0000_1000;
        /// A destination operand was a literal rather than a register
        /// reference.
        const WRITE_ON_LITERAL = 0b0001_0000;
        /// Set when the pause menu's `halt` command requested the stop,
        /// distinguishing an operator-requested halt from a program fault.
        const INTERRUPT        = 0b0010_0000;
    }
}

impl Flags {
    /// True once the run loop must not execute another instruction
    /// (§3 invariant: "After any fault the run loop exits within one more
    /// instruction.").
    pub fn stops_execution(self) -> bool {
        self.intersects(Flags::HALTED | Flags::ERROR)
    }

    /// Serializes to the single byte stored in a state dump (§4.7).
    pub fn to_byte(self) -> u8 {
        self.bits()
    }

    pub fn from_byte(byte: u8) -> Flags {
        Flags::from_bits_truncate(byte)
    }
}
