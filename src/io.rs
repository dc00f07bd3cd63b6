//! Line-buffered character input and byte-granular output (§4.6).

use crate::pause::PauseHandle;
use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

/// A line-oriented buffered reader feeding the `IN` opcode.
///
/// Refills one line at a time from the underlying stream, newline
/// included. A line consisting of exactly `~` is never delivered to the
/// machine: it is consumed here and redirected as a pause request.
pub struct InputBuffer<R> {
    reader: R,
    pending: Vec<u8>,
    cursor: usize,
    pause: PauseHandle,
}

impl<R: BufRead> InputBuffer<R> {
    pub fn new(reader: R, pause: PauseHandle) -> InputBuffer<R> {
        InputBuffer {
            reader,
            pending: Vec::new(),
            cursor: 0,
            pause,
        }
    }

    /// Returns the next input byte, refilling from the underlying stream
    /// as needed. `Ok(None)` signals end of stream.
    pub fn next_byte(&mut self) -> io::Result<Option<u8>> {
        loop {
            if self.cursor < self.pending.len() {
                let byte = self.pending[self.cursor];
                self.cursor += 1;
                return Ok(Some(byte));
            }

            self.pending.clear();
            self.cursor = 0;
            let read = self.reader.read_until(b'\n', &mut self.pending)?;
            if read == 0 {
                return Ok(None);
            }

            if is_pause_sentinel(&self.pending) {
                self.pause.request();
                self.pending.clear();
                continue;
            }
        }
    }
}

/// A line is the pause sentinel if it is exactly `~` followed by an
/// optional newline (with an optional preceding `\r`).
fn is_pause_sentinel(line: &[u8]) -> bool {
    let trimmed = line
        .strip_suffix(b"\n")
        .map(|s| s.strip_suffix(b"\r").unwrap_or(s))
        .unwrap_or(line);
    trimmed == b"~"
}

/// A thin wrapper around a byte sink; each `OUT` writes exactly one byte
/// through it. Observers (§4.8) that need to see the output stream attach
/// a tap, which receives a copy of every emitted byte.
pub struct OutputBuffer<W> {
    sink: W,
    taps: Vec<Rc<RefCell<Vec<u8>>>>,
}

impl<W: Write> OutputBuffer<W> {
    pub fn new(sink: W) -> OutputBuffer<W> {
        OutputBuffer {
            sink,
            taps: Vec::new(),
        }
    }

    pub fn emit(&mut self, byte: u8) -> io::Result<()> {
        self.sink.write_all(&[byte])?;
        for tap in &self.taps {
            tap.borrow_mut().push(byte);
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }

    /// Registers a new tap and returns the shared buffer it writes into.
    pub fn attach_tap(&mut self) -> Rc<RefCell<Vec<u8>>> {
        let tap = Rc::new(RefCell::new(Vec::new()));
        self.taps.push(Rc::clone(&tap));
        tap
    }
}
