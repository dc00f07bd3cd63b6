//! Classifies a raw 16-bit operand word (§3, §4.3).

use crate::constants::{LITERAL_MAX, REGISTER_BASE, REGISTER_MAX};
use crate::word::Word;

/// What a raw operand word denotes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Operand {
    Literal(Word),
    Register(usize),
    Invalid(u16),
}

/// Classifies `raw` per §3's Encoded operand rule:
/// `0..=32767` is a literal, `32768..=32775` is register `raw - 32768`,
/// anything else is invalid.
///
/// ```
/// use synacore::operand::{classify, Operand};
/// use synacore::word::Word;
///
/// assert_eq!(classify(5), Operand::Literal(Word::new(5)));
/// assert_eq!(classify(32768), Operand::Register(0));
/// assert_eq!(classify(32775), Operand::Register(7));
/// assert!(matches!(classify(32776), Operand::Invalid(32776)));
/// ```
pub fn classify(raw: u16) -> Operand {
    if raw <= LITERAL_MAX {
        Operand::Literal(Word::new(raw as u32))
    } else if raw <= REGISTER_MAX {
        Operand::Register((raw - REGISTER_BASE) as usize)
    } else {
        Operand::Invalid(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_value_up_to_32767_is_a_literal() {
        assert_eq!(classify(0), Operand::Literal(Word::ZERO));
        assert_eq!(classify(32767), Operand::Literal(Word::MAX));
    }

    #[test]
    fn register_range_is_32768_through_32775() {
        for index in 0..8u16 {
            assert_eq!(classify(32768 + index), Operand::Register(index as usize));
        }
    }

    #[test]
    fn anything_from_32776_up_is_invalid() {
        assert_eq!(classify(32776), Operand::Invalid(32776));
        assert_eq!(classify(u16::MAX), Operand::Invalid(u16::MAX));
    }
}
