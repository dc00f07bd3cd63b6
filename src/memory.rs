//! The flat, word-addressed memory image (§3, §4.2): 32768 cells, code and
//! stack sharing one address space with no enforced partition.

use crate::constants::ADDRESS_SPACE;
use crate::word::Word;

/// Raised when an index falls outside `{0..32767}` (§4.2: "Boundary
/// policy: read or write outside `{0..32767}` is a programming error").
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct OutOfBounds(pub usize);

/// A dense array of 32768 [`Word`]s, zero-initialized, addressed by a raw
/// `usize` index so callers (the stack bookkeeping in particular, whose
/// `stack_top` may legitimately equal 32768 as a one-past-the-end marker)
/// can represent an index one past the valid range without it silently
/// wrapping back into bounds.
///
/// ```
/// use synacore::memory::Memory;
/// use synacore::word::Word;
///
/// let mut memory = Memory::new();
/// assert_eq!(memory.read(0), Ok(Word::ZERO));
/// memory.write(0, Word::new(42)).unwrap();
/// assert_eq!(memory.read(0), Ok(Word::new(42)));
/// ```
#[derive(Clone)]
pub struct Memory {
    cells: Box<[Word; ADDRESS_SPACE]>,
}

impl Memory {
    /// Builds a zero-initialized memory image.
    pub fn new() -> Memory {
        Memory {
            cells: Box::new([Word::ZERO; ADDRESS_SPACE]),
        }
    }

    /// Total number of addressable cells (always 32768).
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Reads the word at `index`.
    ///
    /// ```
    /// use synacore::memory::{Memory, OutOfBounds};
    ///
    /// let memory = Memory::new();
    /// assert_eq!(memory.read(32767).is_ok(), true);
    /// assert_eq!(memory.read(32768), Err(OutOfBounds(32768)));
    /// ```
    pub fn read(&self, index: usize) -> Result<Word, OutOfBounds> {
        self.cells.get(index).copied().ok_or(OutOfBounds(index))
    }

    /// Writes `value` at `index`.
    ///
    /// ```
    /// use synacore::memory::{Memory, OutOfBounds};
    /// use synacore::word::Word;
    ///
    /// let mut memory = Memory::new();
    /// assert_eq!(memory.write(32767, Word::new(1)), Ok(()));
    /// assert_eq!(memory.write(32768, Word::new(1)), Err(OutOfBounds(32768)));
    /// ```
    pub fn write(&mut self, index: usize, value: Word) -> Result<(), OutOfBounds> {
        match self.cells.get_mut(index) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(OutOfBounds(index)),
        }
    }

    /// Loads a raw little-endian byte stream into memory starting at
    /// address 0, two bytes per word (§4.2, §6). Returns the number of
    /// words loaded, i.e. the length of the loaded region.
    ///
    /// A stream with an odd number of trailing bytes has its final,
    /// incomplete word's high byte treated as zero — nothing in this
    /// system produces such a stream, but the loader never panics on one.
    ///
    /// # Errors
    /// Returns [`OutOfBounds`] if the stream is longer than the memory
    /// itself.
    pub fn load(&mut self, bytes: &[u8]) -> Result<usize, OutOfBounds> {
        let word_count = (bytes.len() + 1) / 2;
        if word_count > self.cells.len() {
            return Err(OutOfBounds(word_count));
        }
        for (index, chunk) in bytes.chunks(2).enumerate() {
            let low = chunk[0];
            let high = chunk.get(1).copied().unwrap_or(0);
            self.cells[index] = Word::from_le_bytes([low, high]);
        }
        Ok(word_count)
    }

    /// Iterates all 32768 cells in address order, for serialization.
    pub fn iter(&self) -> impl Iterator<Item = Word> + '_ {
        self.cells.iter().copied()
    }
}

impl Default for Memory {
    fn default() -> Memory {
        Memory::new()
    }
}
