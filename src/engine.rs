//! The fetch-decode-execute loop (§4.5) and the `Machine` that owns all of
//! a running program's state.

use crate::constants::{REGISTER_COUNT, STACK_ALIGNMENT};
use crate::error::LoadError;
use crate::flags::Flags;
use crate::instruction::Opcode;
use crate::io::{InputBuffer, OutputBuffer};
use crate::memory::Memory;
use crate::observer::ObserverTag;
use crate::operand::{classify, Operand};
use crate::pause::PauseHandle;
use crate::word::{Address, Word};
use log::{trace, warn};
use std::io::{BufRead, Write};

/// The engine's three externally visible states (§4.5).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RunState {
    Running,
    Paused,
    Terminated,
}

/// A hook invoked once between instructions (§4.8). Implementations
/// return `true` to request their own detachment after this call.
pub trait Observer {
    fn tag(&self) -> ObserverTag;
    fn on_step(&mut self, machine: &mut Machine) -> bool;
}

/// All of a running program's state: registers, memory, the stack
/// pointers, flags, and the I/O buffers and observers attached to it.
pub struct Machine {
    registers: [Word; REGISTER_COUNT],
    null_register: Word,
    memory: Memory,
    ip: Address,
    stack_base: usize,
    stack_top: usize,
    flags: Flags,
    pause: PauseHandle,
    input: InputBuffer<Box<dyn BufRead>>,
    output: OutputBuffer<Box<dyn Write>>,
    observers: Vec<Box<dyn Observer>>,
}

impl Machine {
    /// Builds a fresh machine with no program loaded, reading `IN` from
    /// `input` and writing `OUT` to `output`.
    pub fn new(input: Box<dyn BufRead>, output: Box<dyn Write>) -> Machine {
        let pause = PauseHandle::new();
        Machine {
            registers: [Word::ZERO; REGISTER_COUNT],
            null_register: Word::ZERO,
            memory: Memory::new(),
            ip: Address::new(0),
            stack_base: 0,
            stack_top: 0,
            input: InputBuffer::new(input, pause.clone()),
            output: OutputBuffer::new(output),
            flags: Flags::empty(),
            pause,
            observers: Vec::new(),
        }
    }

    /// Convenience constructor avoiding manual boxing at call sites.
    pub fn with_io<R, W>(input: R, output: W) -> Machine
    where
        R: BufRead + 'static,
        W: Write + 'static,
    {
        Machine::new(Box::new(input), Box::new(output))
    }

    /// Loads a program image starting at address 0 (§4.2, §6) and
    /// establishes the stack immediately past it, rounded up to the next
    /// 8-word boundary (§3, Stack).
    pub fn load_program(&mut self, bytes: &[u8]) -> Result<(), LoadError> {
        let loaded = self
            .memory
            .load(bytes)
            .map_err(|_| LoadError::ProgramTooLarge {
                len: bytes.len(),
                max: self.memory.len() * 2,
            })?;
        let base = round_up(loaded, STACK_ALIGNMENT);
        self.stack_base = base;
        self.stack_top = base;
        self.ip = Address::new(0);
        Ok(())
    }

    /// A clone of this machine's pause flag, for a host binary to wire to
    /// whatever external signal it wants to treat as a pause request
    /// (§4.10, §5). The engine itself never does this wiring.
    pub fn pause_handle(&self) -> PauseHandle {
        self.pause.clone()
    }

    /// Clears a pending pause request, e.g. in response to the pause
    /// menu's `resume` command. Returns whether a pause had actually been
    /// requested.
    pub fn resume(&mut self) -> bool {
        self.pause.take()
    }

    /// Sets `HALTED | INTERRUPT`, the pause menu's `halt` command
    /// (§4.10) — an operator-requested stop, distinct from a program
    /// fault or a plain `HALT` instruction.
    pub fn halt_by_interrupt(&mut self) {
        self.flags |= Flags::HALTED | Flags::INTERRUPT;
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn registers(&self) -> &[Word; REGISTER_COUNT] {
        &self.registers
    }

    pub fn null_register(&self) -> Word {
        self.null_register
    }

    pub fn ip(&self) -> Address {
        self.ip
    }

    pub fn stack_base(&self) -> usize {
        self.stack_base
    }

    pub fn stack_top(&self) -> usize {
        self.stack_top
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Exposes the output stream so an observer can attach a tap (§4.8).
    pub fn output_mut(&mut self) -> &mut OutputBuffer<Box<dyn Write>> {
        &mut self.output
    }

    pub fn has_observer(&self, tag: ObserverTag) -> bool {
        self.observers.iter().any(|o| o.tag() == tag)
    }

    /// Attaches `observer`, first detaching any existing observer with the
    /// same tag (§9: "toggling removes the entry with that tag or
    /// installs a fresh one").
    pub fn attach_observer(&mut self, observer: Box<dyn Observer>) {
        self.detach_observer(observer.tag());
        self.observers.push(observer);
    }

    pub fn detach_observer(&mut self, tag: ObserverTag) {
        self.observers.retain(|o| o.tag() != tag);
    }

    fn run_observers(&mut self) {
        let mut index = 0;
        while index < self.observers.len() {
            let mut observer = self.observers.swap_remove(index);
            let detach = observer.on_step(self);
            if !detach {
                self.observers.push(observer);
                let last = self.observers.len() - 1;
                self.observers.swap(index, last);
                index += 1;
            }
        }
    }

    /// Whether the stack is empty, i.e. `stack_top == stack_base`.
    fn stack_is_empty(&self) -> bool {
        self.stack_top <= self.stack_base
    }

    fn push(&mut self, value: Word) {
        match self.memory.write(self.stack_top, value) {
            Ok(()) => self.stack_top += 1,
            Err(_) => self.flags |= Flags::BAD_INTEGER | Flags::ERROR,
        }
    }

    /// Pre-decrements and reads, unconditionally — used both by `POP`
    /// (through [`Machine::pop_checked`]) and by `RET`, which does not
    /// treat an empty stack as a fault (§4.4).
    fn raw_pop(&mut self) -> Word {
        self.stack_top = self.stack_top.saturating_sub(1);
        self.memory.read(self.stack_top).unwrap_or(Word::ZERO)
    }

    fn pop_checked(&mut self) -> Word {
        let was_empty = self.stack_is_empty();
        let value = self.raw_pop();
        if was_empty {
            self.flags |= Flags::STACK_UNDERFLOW | Flags::ERROR;
        }
        value
    }

    fn value_of(&mut self, raw: u16) -> Word {
        match classify(raw) {
            Operand::Literal(w) => w,
            Operand::Register(i) => self.registers[i],
            Operand::Invalid(_) => {
                self.flags |= Flags::BAD_INTEGER | Flags::ERROR;
                self.null_register
            }
        }
    }

    fn resolve_destination(&mut self, raw: u16) -> &mut Word {
        match classify(raw) {
            Operand::Literal(_) => {
                self.flags |= Flags::WRITE_ON_LITERAL | Flags::ERROR;
                &mut self.null_register
            }
            Operand::Register(i) => &mut self.registers[i],
            Operand::Invalid(_) => {
                self.flags |= Flags::BAD_INTEGER | Flags::ERROR;
                &mut self.null_register
            }
        }
    }

    /// Reads the word at `ip` and advances `ip` past it. Used uniformly
    /// for the opcode word and every operand word (§4.5).
    fn fetch_word(&mut self) -> u16 {
        let addr = self.ip;
        let word = self.memory.read(addr.as_usize()).unwrap_or(Word::ZERO).get();
        match addr.checked_increment() {
            Some(next) => self.ip = next,
            None => self.flags |= Flags::BAD_INTEGER | Flags::ERROR,
        }
        word
    }

    /// Executes exactly one instruction, then runs attached observers.
    /// Returns `false` if the run loop should stop before fetching
    /// another instruction.
    pub fn step(&mut self) -> bool {
        if self.flags.stops_execution() {
            return false;
        }
        if self.pause.is_requested() {
            return false;
        }

        let opcode_addr = self.ip;
        let raw_opcode = self.fetch_word();
        match Opcode::from_word(raw_opcode) {
            Some(opcode) => {
                trace!("ip={:?} opcode={}", opcode_addr.word(), opcode);
                self.execute(opcode, opcode_addr);
            }
            None => {
                warn!("wrong opcode {} at {:?}", raw_opcode, opcode_addr.word());
                self.flags |= Flags::ERROR;
            }
        }

        self.run_observers();
        !self.flags.stops_execution() && !self.pause.is_requested()
    }

    fn execute(&mut self, opcode: Opcode, opcode_addr: Address) {
        match opcode {
            Opcode::Halt => {
                self.flags |= Flags::HALTED;
                // ip is left pointing at the instruction that halted
                // execution, not past it (§8 scenario 1).
                self.ip = opcode_addr;
            }
            Opcode::Set => {
                let dst_raw = self.fetch_word();
                let src_raw = self.fetch_word();
                let value = self.value_of(src_raw);
                *self.resolve_destination(dst_raw) = value;
            }
            Opcode::Push => {
                let a_raw = self.fetch_word();
                let value = self.value_of(a_raw);
                self.push(value);
            }
            Opcode::Pop => {
                let dst_raw = self.fetch_word();
                let value = self.pop_checked();
                *self.resolve_destination(dst_raw) = value;
            }
            Opcode::Eq => {
                let dst_raw = self.fetch_word();
                let b_raw = self.fetch_word();
                let c_raw = self.fetch_word();
                let bv = self.value_of(b_raw);
                let cv = self.value_of(c_raw);
                let result = Word::new((bv == cv) as u32);
                *self.resolve_destination(dst_raw) = result;
            }
            Opcode::Gt => {
                let dst_raw = self.fetch_word();
                let b_raw = self.fetch_word();
                let c_raw = self.fetch_word();
                let bv = self.value_of(b_raw);
                let cv = self.value_of(c_raw);
                let result = Word::new((bv > cv) as u32);
                *self.resolve_destination(dst_raw) = result;
            }
            Opcode::Jmp => {
                let a_raw = self.fetch_word();
                let target = self.value_of(a_raw);
                self.ip = Address::from(target);
            }
            Opcode::Jt => {
                let a_raw = self.fetch_word();
                let b_raw = self.fetch_word();
                let av = self.value_of(a_raw);
                let target = self.value_of(b_raw);
                if av != Word::ZERO {
                    self.ip = Address::from(target);
                }
            }
            Opcode::Jf => {
                let a_raw = self.fetch_word();
                let b_raw = self.fetch_word();
                let av = self.value_of(a_raw);
                let target = self.value_of(b_raw);
                if av == Word::ZERO {
                    self.ip = Address::from(target);
                }
            }
            Opcode::Add => {
                let dst_raw = self.fetch_word();
                let b_raw = self.fetch_word();
                let c_raw = self.fetch_word();
                let bv = self.value_of(b_raw);
                let cv = self.value_of(c_raw);
                let result = bv.add(cv);
                *self.resolve_destination(dst_raw) = result;
            }
            Opcode::Mult => {
                let dst_raw = self.fetch_word();
                let b_raw = self.fetch_word();
                let c_raw = self.fetch_word();
                let bv = self.value_of(b_raw);
                let cv = self.value_of(c_raw);
                let result = bv.mul(cv);
                *self.resolve_destination(dst_raw) = result;
            }
            Opcode::Mod => {
                let dst_raw = self.fetch_word();
                let b_raw = self.fetch_word();
                let c_raw = self.fetch_word();
                let bv = self.value_of(b_raw);
                let cv = self.value_of(c_raw);
                match bv.checked_mod(cv) {
                    Some(result) => *self.resolve_destination(dst_raw) = result,
                    None => {
                        self.flags |= Flags::ERROR;
                        let _ = self.resolve_destination(dst_raw);
                    }
                }
            }
            Opcode::And => {
                let dst_raw = self.fetch_word();
                let b_raw = self.fetch_word();
                let c_raw = self.fetch_word();
                let bv = self.value_of(b_raw);
                let cv = self.value_of(c_raw);
                let result = bv.and(cv);
                *self.resolve_destination(dst_raw) = result;
            }
            Opcode::Or => {
                let dst_raw = self.fetch_word();
                let b_raw = self.fetch_word();
                let c_raw = self.fetch_word();
                let bv = self.value_of(b_raw);
                let cv = self.value_of(c_raw);
                let result = bv.or(cv);
                *self.resolve_destination(dst_raw) = result;
            }
            Opcode::Not => {
                let dst_raw = self.fetch_word();
                let b_raw = self.fetch_word();
                let bv = self.value_of(b_raw);
                let result = bv.not();
                *self.resolve_destination(dst_raw) = result;
            }
            Opcode::Rmem => {
                let dst_raw = self.fetch_word();
                let b_raw = self.fetch_word();
                let addr = self.value_of(b_raw);
                let value = match self.memory.read(addr.get() as usize) {
                    Ok(w) => w,
                    Err(_) => {
                        self.flags |= Flags::BAD_INTEGER | Flags::ERROR;
                        self.null_register
                    }
                };
                *self.resolve_destination(dst_raw) = value;
            }
            Opcode::Wmem => {
                let a_raw = self.fetch_word();
                let b_raw = self.fetch_word();
                let addr = self.value_of(a_raw);
                let value = self.value_of(b_raw);
                if self.memory.write(addr.get() as usize, value).is_err() {
                    self.flags |= Flags::BAD_INTEGER | Flags::ERROR;
                }
            }
            Opcode::Call => {
                let a_raw = self.fetch_word();
                let target = self.value_of(a_raw);
                let return_addr = opcode_addr.word().add(Word::new(2));
                self.push(return_addr);
                self.ip = Address::from(target);
            }
            Opcode::Ret => {
                if self.stack_is_empty() {
                    self.flags |= Flags::HALTED;
                } else {
                    let target = self.raw_pop();
                    self.ip = Address::from(target);
                }
            }
            Opcode::Out => {
                let a_raw = self.fetch_word();
                let value = self.value_of(a_raw);
                let byte = (value.get() & 0xFF) as u8;
                if let Err(err) = self.output.emit(byte) {
                    warn!("OUT failed to write: {}", err);
                    self.flags |= Flags::ERROR;
                }
            }
            Opcode::In => {
                let dst_raw = self.fetch_word();
                match self.input.next_byte() {
                    Ok(Some(byte)) => {
                        let value = Word::new(byte as u32);
                        *self.resolve_destination(dst_raw) = value;
                    }
                    Ok(None) => {
                        self.flags |= Flags::ERROR;
                    }
                    Err(err) => {
                        warn!("IN failed to read: {}", err);
                        self.flags |= Flags::ERROR;
                    }
                }
            }
            Opcode::Noop => {}
        }
    }

    /// Runs instructions until the machine halts, faults, or a pause is
    /// requested (§4.5). Call again after handling the pause (having
    /// cleared it via [`Machine::resume`]) to continue.
    pub fn run(&mut self) -> RunState {
        while self.step() {}
        if self.flags.stops_execution() {
            // A fault alone (no trailing HALT) still terminates the run
            // loop for good; HALTED marks that termination is final,
            // distinct from a pause (§4.5, §8 scenario 5).
            self.flags |= Flags::HALTED;
            RunState::Terminated
        } else if self.pause.is_requested() {
            RunState::Paused
        } else {
            RunState::Running
        }
    }

    pub(crate) fn load_state_fields(
        &mut self,
        flags: Flags,
        registers: [Word; REGISTER_COUNT],
        ip: Address,
        stack_base: usize,
        stack_top: usize,
        null_register: Word,
        memory: Memory,
    ) {
        self.flags = flags;
        self.registers = registers;
        self.ip = ip;
        self.stack_base = stack_base;
        self.stack_top = stack_top;
        self.null_register = null_register;
        self.memory = memory;
    }
}

fn round_up(value: usize, alignment: usize) -> usize {
    (value + alignment - 1) / alignment * alignment
}
