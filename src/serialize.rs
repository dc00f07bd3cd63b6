//! Saves and restores a machine's complete state as a flat byte stream
//! (§4.7): flags, the eight registers, `ip`, the stack pointers, the null
//! register, and all 32768 memory words, positionally, with no header or
//! version tag.

use crate::constants::{ADDRESS_SPACE, REGISTER_COUNT};
use crate::engine::Machine;
use crate::error::LoadError;
use crate::flags::Flags;
use crate::memory::Memory;
use crate::word::{Address, Word};
use std::io::{self, Read, Write};

const FLAGS_LEN: usize = 1;
const REGISTERS_LEN: usize = REGISTER_COUNT * 2;
const IP_LEN: usize = 2;
const STACK_BASE_LEN: usize = 2;
const STACK_TOP_LEN: usize = 2;
const NULL_REGISTER_LEN: usize = 2;
const MEMORY_LEN: usize = ADDRESS_SPACE * 2;

/// Total length of a serialized state, in bytes.
pub const STATE_LEN: usize =
    FLAGS_LEN + REGISTERS_LEN + IP_LEN + STACK_BASE_LEN + STACK_TOP_LEN + NULL_REGISTER_LEN + MEMORY_LEN;

/// Writes `machine`'s complete state to `writer` (§4.7).
pub fn write_state(machine: &Machine, writer: &mut dyn Write) -> io::Result<()> {
    writer.write_all(&[machine.flags().to_byte()])?;
    for register in machine.registers() {
        writer.write_all(&register.to_le_bytes())?;
    }
    writer.write_all(&machine.ip().word().to_le_bytes())?;
    writer.write_all(&(machine.stack_base() as u16).to_le_bytes())?;
    writer.write_all(&(machine.stack_top() as u16).to_le_bytes())?;
    writer.write_all(&machine.null_register().to_le_bytes())?;
    for word in machine.memory().iter() {
        writer.write_all(&word.to_le_bytes())?;
    }
    Ok(())
}

/// Reads a complete state from `reader` and installs it into `machine`,
/// replacing whatever program and register contents it held (§4.7). The
/// stream must be exactly [`STATE_LEN`] bytes; anything else is a
/// [`LoadError::WrongStateLength`].
pub fn load_state(machine: &mut Machine, reader: &mut dyn Read) -> Result<(), LoadError> {
    let mut bytes = Vec::with_capacity(STATE_LEN);
    reader
        .read_to_end(&mut bytes)
        .map_err(|_| LoadError::WrongStateLength {
            expected: STATE_LEN,
            actual: 0,
        })?;
    if bytes.len() != STATE_LEN {
        return Err(LoadError::WrongStateLength {
            expected: STATE_LEN,
            actual: bytes.len(),
        });
    }

    let mut cursor = 0;
    let flags = Flags::from_byte(bytes[cursor]);
    cursor += FLAGS_LEN;

    let mut registers = [Word::ZERO; REGISTER_COUNT];
    for register in registers.iter_mut() {
        *register = read_word(&bytes, &mut cursor);
    }

    let ip = Address::from(read_word(&bytes, &mut cursor));
    let stack_base = read_u16(&bytes, &mut cursor) as usize;
    let stack_top = read_u16(&bytes, &mut cursor) as usize;
    let null_register = read_word(&bytes, &mut cursor);

    let mut memory = Memory::new();
    for index in 0..ADDRESS_SPACE {
        let word = read_word(&bytes, &mut cursor);
        memory
            .write(index, word)
            .expect("index is always within ADDRESS_SPACE");
    }

    machine.load_state_fields(flags, registers, ip, stack_base, stack_top, null_register, memory);
    Ok(())
}

fn read_u16(bytes: &[u8], cursor: &mut usize) -> u16 {
    let value = u16::from_le_bytes([bytes[*cursor], bytes[*cursor + 1]]);
    *cursor += 2;
    value
}

fn read_word(bytes: &[u8], cursor: &mut usize) -> Word {
    let word = Word::from_le_bytes([bytes[*cursor], bytes[*cursor + 1]]);
    *cursor += 2;
    word
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_a_fresh_machine() {
        let mut machine = Machine::with_io(Cursor::new(Vec::new()), Vec::new());
        machine.load_program(&[19, 0, 65, 0, 0, 0]).unwrap();

        let mut bytes = Vec::new();
        write_state(&machine, &mut bytes).unwrap();
        assert_eq!(bytes.len(), STATE_LEN);

        let mut restored = Machine::with_io(Cursor::new(Vec::new()), Vec::new());
        load_state(&mut restored, &mut Cursor::new(bytes)).unwrap();
        assert_eq!(restored.flags(), machine.flags());
        assert_eq!(restored.registers(), machine.registers());
        assert_eq!(restored.ip(), machine.ip());
        assert_eq!(restored.stack_base(), machine.stack_base());
        assert_eq!(restored.stack_top(), machine.stack_top());
    }

    #[test]
    fn rejects_a_short_stream() {
        let mut machine = Machine::with_io(Cursor::new(Vec::new()), Vec::new());
        let mut short = Cursor::new(vec![0u8; 10]);
        let err = load_state(&mut machine, &mut short).unwrap_err();
        match err {
            LoadError::WrongStateLength { expected, actual } => {
                assert_eq!(expected, STATE_LEN);
                assert_eq!(actual, 10);
            }
            _ => panic!("wrong error variant"),
        }
    }

    #[test]
    fn preserves_state_after_running_to_a_fault() {
        let mut machine = Machine::with_io(Cursor::new(Vec::new()), Vec::new());
        machine.load_program(&[3, 32768, 0]).unwrap();
        machine.run();

        let mut bytes = Vec::new();
        write_state(&machine, &mut bytes).unwrap();

        let mut restored = Machine::with_io(Cursor::new(Vec::new()), Vec::new());
        load_state(&mut restored, &mut Cursor::new(bytes)).unwrap();
        assert_eq!(restored.flags(), machine.flags());
        assert_eq!(restored.stack_top(), machine.stack_top());
    }
}
